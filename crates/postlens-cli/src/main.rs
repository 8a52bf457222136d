use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod analyze;
mod graph;
mod report;

#[derive(Debug, Parser)]
#[command(name = "postlens")]
#[command(about = "Post analytics, outlier detection, and media analysis for business accounts")]
struct Cli {
    /// Business account id to act as (overrides `IG_ACCOUNT_ID`)
    #[arg(long, global = true)]
    account: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List business accounts the access token holds insights permission for
    Accounts,
    /// Export recent owned posts with per-post insights as JSON
    Insights {
        /// Number of recent posts to fetch
        #[arg(long, default_value_t = 25, value_parser = parse_count)]
        count: usize,
        /// Output file
        #[arg(long, default_value = "instagram_insights.json")]
        output: PathBuf,
    },
    /// Export account-level insights as JSON
    AccountInsights {
        /// Aggregation period (day, week, days_28, lifetime)
        #[arg(long, default_value = "day")]
        period: String,
        /// Start of the range, unix seconds
        #[arg(long)]
        since: Option<i64>,
        /// End of the range, unix seconds
        #[arg(long)]
        until: Option<i64>,
        /// Named range such as `last_7d`; overrides --since/--until
        #[arg(long)]
        preset: Option<String>,
        /// Metric to request (repeatable; defaults to the standard set)
        #[arg(long = "metric")]
        metrics: Vec<String>,
        /// Output file
        #[arg(long, default_value = "account_insights.json")]
        output: PathBuf,
    },
    /// Download media for recent owned posts, including carousel children
    Download {
        /// Number of recent posts to download
        #[arg(long, default_value_t = 10, value_parser = parse_count)]
        count: usize,
        /// Destination folder (defaults to `POSTLENS_MEDIA_DIR`)
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Look up another business or creator account by handle or profile URL
    Discover {
        /// Profile URL or handle
        profile: String,
        /// Number of recent posts to fetch
        #[arg(long, default_value_t = 10, value_parser = parse_count)]
        count: usize,
        /// Output file (defaults to `<username>_insights.json`)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also download the fetched posts' media
        #[arg(long)]
        download: bool,
        /// Download folder (defaults to `POSTLENS_MEDIA_DIR`)
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Find posts well above average engagement, download and analyze them
    Outliers {
        /// Handle or profile URL; your own account is read via insights
        username: String,
        /// Number of recent posts to sample
        #[arg(long, default_value_t = 25, value_parser = parse_count)]
        count: usize,
        /// A post is an outlier when its likes exceed this multiple of the mean
        #[arg(long, default_value_t = 2.0, value_parser = parse_multiplier)]
        multiplier: f64,
    },
    /// Re-run media analysis over an existing folder
    Analyze {
        /// Folder of downloaded media
        #[arg(long)]
        dir: PathBuf,
        /// Post metadata JSON written by `insights`, `discover`, or `outliers`
        #[arg(long)]
        posts: Option<PathBuf>,
        /// Output file (defaults to `<dir>/analysis_results.json`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate an in-depth HTML report from outlier analysis results
    Report {
        /// Account handle the results belong to
        username: String,
        /// Report instructions
        #[arg(long)]
        prompt: PathBuf,
        /// Behavioral framework reference
        #[arg(long)]
        framework: PathBuf,
        /// HTML fragment placed at the top of the report
        #[arg(long)]
        banner_html: Option<PathBuf>,
        /// Results JSON (defaults to the `outliers` output for this username)
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

fn parse_count(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_multiplier(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err("must be a positive number".to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Loads `.env` before reading the environment.
    let config = postlens_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let account = cli.account.as_deref();

    match cli.command {
        Some(Commands::Accounts) => graph::run_accounts(&config).await?,
        Some(Commands::Insights { count, output }) => {
            graph::run_insights(&config, account, count, &output).await?;
        }
        Some(Commands::AccountInsights {
            period,
            since,
            until,
            preset,
            metrics,
            output,
        }) => {
            let query = graph::account_insights_query(period, since, until, preset, metrics);
            graph::run_account_insights(&config, account, &query, &output).await?;
        }
        Some(Commands::Download { count, folder }) => {
            let folder = folder.unwrap_or_else(|| config.media_dir.clone());
            graph::run_download(&config, account, count, &folder).await?;
        }
        Some(Commands::Discover {
            profile,
            count,
            output,
            download,
            folder,
        }) => {
            let opts = graph::DiscoverOptions {
                count,
                output,
                download_to: download.then(|| folder.unwrap_or_else(|| config.media_dir.clone())),
            };
            graph::run_discover(&config, account, &profile, &opts).await?;
        }
        Some(Commands::Outliers {
            username,
            count,
            multiplier,
        }) => {
            analyze::run_outliers(&config, account, &username, count, multiplier).await?;
        }
        Some(Commands::Analyze { dir, posts, output }) => {
            analyze::run_analyze(&config, &dir, posts.as_deref(), output).await?;
        }
        Some(Commands::Report {
            username,
            prompt,
            framework,
            banner_html,
            results,
        }) => {
            let paths = report::ReportPaths {
                prompt,
                framework,
                banner_html,
                results,
            };
            report::run_report(&config, &username, paths).await?;
        }
        None => println!("postlens: run `postlens --help` for available commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
