//! Social-graph command handlers: accounts, insights exports, downloads, and
//! business discovery.
//!
//! Per-post failures inside the graph client are logged and counted there;
//! anything that reaches these handlers ends the command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use postlens_core::{AppConfig, CoreError, Post, RetryPolicy, Session};
use postlens_graph::media::MEDIA_FIELDS_WITH_CHILDREN;
use postlens_graph::{
    extract_username, AccountInsightsQuery, DownloadReport, GraphClient, GraphClientOptions,
    MediaDownloader,
};
use serde::Serialize;

/// Opens a session and a graph client for it.
///
/// # Errors
///
/// Returns [`CoreError::MissingToken`] when no access token is configured, or
/// an error if the HTTP client cannot be built.
pub(crate) fn connect(
    config: &AppConfig,
    account: Option<&str>,
) -> anyhow::Result<(Session, GraphClient)> {
    let session = Session::from_config(config, account)?;
    let client = GraphClient::new(
        session.access_token(),
        &GraphClientOptions::from_app_config(config),
    )
    .map_err(|e| anyhow::anyhow!("failed to build graph client: {e}"))?;
    Ok((session, client))
}

/// Media downloader using the configured timeout and retry budget.
pub(crate) fn downloader<'a>(config: &AppConfig, graph: &'a GraphClient) -> MediaDownloader<'a> {
    let retry = RetryPolicy::exponential(
        config.max_retries.saturating_add(1),
        Duration::from_millis(config.retry_backoff_base_ms),
    )
    .with_jitter();
    MediaDownloader::new(
        graph,
        Duration::from_secs(config.download_timeout_secs),
        retry,
    )
}

/// Writes `value` as pretty JSON, creating the parent directory.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub(crate) fn print_download_report(report: &DownloadReport, folder: &Path) {
    println!(
        "downloaded {} file(s) to {} ({} skipped, {} failed)",
        report.saved.len(),
        folder.display(),
        report.skipped,
        report.failed
    );
}

/// List the business accounts the token can read insights for.
///
/// # Errors
///
/// Returns an error if `ACCESS_TOKEN`, `APP_ID`, or `APP_SECRET` is missing,
/// or the token inspection fails.
pub(crate) async fn run_accounts(config: &AppConfig) -> anyhow::Result<()> {
    let app_id = config
        .app_id
        .as_deref()
        .ok_or(CoreError::MissingCredential("APP_ID"))?;
    let app_secret = config
        .app_secret
        .as_deref()
        .ok_or(CoreError::MissingCredential("APP_SECRET"))?;
    let (session, graph) = connect(config, None)?;

    let accounts = graph
        .list_accounts(session.access_token(), app_id, app_secret)
        .await?;

    println!("{} business account(s):", accounts.len());
    for (idx, account) in accounts.iter().enumerate() {
        println!("  {}. {} (@{})", idx + 1, account.id, account.username);
    }
    println!("pass one with --account <ID> or set IG_ACCOUNT_ID");
    Ok(())
}

/// Export recent owned posts with their insights.
///
/// # Errors
///
/// Returns an error if no token or account is configured, the media listing
/// fails, or the output cannot be written.
pub(crate) async fn run_insights(
    config: &AppConfig,
    account: Option<&str>,
    count: usize,
    output: &Path,
) -> anyhow::Result<()> {
    let (session, graph) = connect(config, account)?;
    let ig_id = session.require_account()?;

    let posts = graph.fetch_post_insights(ig_id, count).await?;
    write_json(output, &posts)?;

    println!(
        "exported insights for {} post(s) to {}",
        posts.len(),
        output.display()
    );
    Ok(())
}

/// Build an account-insights query from command-line values, falling back to
/// the default metric set when none are given.
pub(crate) fn account_insights_query(
    period: String,
    since: Option<i64>,
    until: Option<i64>,
    preset: Option<String>,
    metrics: Vec<String>,
) -> AccountInsightsQuery {
    let defaults = AccountInsightsQuery::default();
    AccountInsightsQuery {
        metrics: if metrics.is_empty() {
            defaults.metrics
        } else {
            metrics
        },
        period,
        since,
        until,
        date_preset: preset.filter(|p| !p.trim().is_empty()),
    }
}

/// Export account-level insights.
///
/// # Errors
///
/// Returns an error if no token or account is configured, the insights call
/// fails, or the output cannot be written.
pub(crate) async fn run_account_insights(
    config: &AppConfig,
    account: Option<&str>,
    query: &AccountInsightsQuery,
    output: &Path,
) -> anyhow::Result<()> {
    let (session, graph) = connect(config, account)?;
    let ig_id = session.require_account()?;

    let rows = graph.fetch_account_insights(ig_id, query).await?;
    write_json(output, &rows)?;

    println!(
        "exported {} account insight row(s) for period '{}' to {}",
        rows.len(),
        query.period,
        output.display()
    );
    Ok(())
}

/// Download media for recent owned posts.
///
/// # Errors
///
/// Returns an error if no token or account is configured, the media listing
/// fails, or `folder` cannot be created.
pub(crate) async fn run_download(
    config: &AppConfig,
    account: Option<&str>,
    count: usize,
    folder: &Path,
) -> anyhow::Result<()> {
    let (session, graph) = connect(config, account)?;
    let ig_id = session.require_account()?;

    let posts = graph
        .fetch_recent_media(ig_id, count, MEDIA_FIELDS_WITH_CHILDREN)
        .await?;
    if posts.is_empty() {
        println!("no media found");
        return Ok(());
    }

    let report = downloader(config, &graph).download_posts(&posts, folder).await?;
    print_download_report(&report, folder);
    Ok(())
}

/// Options for `discover`.
#[derive(Debug)]
pub(crate) struct DiscoverOptions {
    pub count: usize,
    pub output: Option<PathBuf>,
    /// Download folder when media should be fetched too.
    pub download_to: Option<PathBuf>,
}

/// Default export path for a discovered profile.
pub(crate) fn discover_output_path(username: &str) -> PathBuf {
    PathBuf::from(format!("{username}_insights.json"))
}

/// Look up another account via business discovery and export its posts.
///
/// # Errors
///
/// Returns an error if the profile cannot be parsed into a handle, no token
/// or account is configured, discovery is unavailable for the handle, or the
/// output cannot be written.
pub(crate) async fn run_discover(
    config: &AppConfig,
    account: Option<&str>,
    profile: &str,
    opts: &DiscoverOptions,
) -> anyhow::Result<()> {
    let username = extract_username(profile)?;
    let (session, graph) = connect(config, account)?;
    let ig_id = session.require_account()?;

    let discovered = graph
        .business_discovery(ig_id, &username, opts.count)
        .await?;

    println!(
        "@{}: {} followers, {} posts total, {} fetched",
        discovered.username,
        discovered
            .followers_count
            .map_or_else(|| "?".to_string(), |n| n.to_string()),
        discovered
            .media_count
            .map_or_else(|| "?".to_string(), |n| n.to_string()),
        discovered.posts.len()
    );

    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| discover_output_path(&discovered.username));
    write_json(&output, &discovered.posts)?;
    println!("exported posts to {}", output.display());

    if let Some(folder) = &opts.download_to {
        download_discovered(config, &graph, &discovered.posts, folder).await?;
    }
    Ok(())
}

async fn download_discovered(
    config: &AppConfig,
    graph: &GraphClient,
    posts: &[Post],
    folder: &Path,
) -> anyhow::Result<()> {
    if posts.is_empty() {
        println!("no media available for that profile");
        return Ok(());
    }
    let report = downloader(config, graph).download_posts(posts, folder).await?;
    print_download_report(&report, folder);
    Ok(())
}
