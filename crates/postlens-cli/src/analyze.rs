//! Outlier detection and media analysis command handlers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use postlens_analysis::{analyze_media_dir, AnalysisOptions, AnalysisSummary, GeminiClient};
use postlens_core::{select_outliers, AppConfig, ChildOrder, CoreError, Post};
use postlens_graph::{extract_username, GraphClient};

use crate::graph::{connect, downloader, print_download_report, write_json};

/// Generation calls carry every staged file and routinely outlive the plain
/// request timeout.
const MIN_INFERENCE_TIMEOUT_SECS: u64 = 120;

/// Hosted inference client from configuration.
///
/// # Errors
///
/// Returns [`CoreError::MissingCredential`] when `GEMINI_API_KEY` is unset.
pub(crate) fn inference_client(config: &AppConfig) -> anyhow::Result<GeminiClient> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .ok_or(CoreError::MissingCredential("GEMINI_API_KEY"))?;
    GeminiClient::new(
        api_key,
        &config.inference_base_url,
        config.request_timeout_secs.max(MIN_INFERENCE_TIMEOUT_SECS),
        &config.user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build inference client: {e}"))
}

/// `<output_dir>/<username>`: media and results for one outlier run.
pub(crate) fn outlier_folder(config: &AppConfig, username: &str) -> PathBuf {
    config.output_dir.join(username)
}

/// `<folder>/<username>_outlier_media_results.json`.
pub(crate) fn results_path(folder: &Path, username: &str) -> PathBuf {
    folder.join(format!("{username}_outlier_media_results.json"))
}

/// `<folder>/<username>_posts.json`: metadata snapshot for later `analyze` runs.
pub(crate) fn posts_snapshot_path(folder: &Path, username: &str) -> PathBuf {
    folder.join(format!("{username}_posts.json"))
}

fn same_handle(a: &str, b: &str) -> bool {
    a.trim_start_matches('@')
        .eq_ignore_ascii_case(b.trim_start_matches('@'))
}

/// Recent posts for `username`: owned insights when it is the selected
/// account, business discovery otherwise.
async fn sample_posts(
    graph: &GraphClient,
    ig_id: &str,
    username: &str,
    count: usize,
) -> anyhow::Result<Vec<Post>> {
    let own = graph.fetch_username(ig_id).await?;
    if own.as_deref().is_some_and(|own| same_handle(own, username)) {
        tracing::info!(username, "reading own account via insights");
        Ok(graph.fetch_post_insights(ig_id, count).await?)
    } else {
        tracing::info!(username, "reading other account via business discovery");
        let profile = graph.business_discovery(ig_id, username, count).await?;
        Ok(profile.posts)
    }
}

fn print_analysis_summary(summary: &AnalysisSummary) {
    println!(
        "analysis: {} group(s), {} uploaded, {} active, {} cleaned up",
        summary.groups, summary.uploaded, summary.active, summary.deleted
    );
    if summary.parsed {
        println!(
            "wrote {} entr(ies) to {}",
            summary.entries.len(),
            summary.output_path.display()
        );
    } else {
        println!(
            "model output could not be parsed; wrote placeholder to {}",
            summary.output_path.display()
        );
    }
}

/// Detect outlier posts, download their media, and analyze it.
///
/// # Errors
///
/// Returns an error if a credential or the account is missing, the handle is
/// malformed, the post sample cannot be fetched, or the analysis stage fails
/// outright. Individual download and upload failures are only counted.
pub(crate) async fn run_outliers(
    config: &AppConfig,
    account: Option<&str>,
    profile: &str,
    count: usize,
    multiplier: f64,
) -> anyhow::Result<()> {
    let username = extract_username(profile)?;
    let gemini = inference_client(config)?;
    let (session, graph) = connect(config, account)?;
    let ig_id = session.require_account()?;

    let posts = sample_posts(&graph, ig_id, &username, count).await?;
    let outliers = select_outliers(&posts, multiplier);
    println!(
        "@{username}: {} post(s) sampled, mean likes {:.1}, threshold {:.1}, {} outlier(s)",
        posts.len(),
        outliers.mean,
        outliers.threshold,
        outliers.posts.len()
    );
    if outliers.posts.is_empty() {
        println!("no outliers above {multiplier}x the mean; nothing to analyze");
        return Ok(());
    }
    for post in &outliers.posts {
        println!(
            "  {} {} likes={} comments={}",
            post.id, post.media_type, post.metrics.likes, post.metrics.comments
        );
    }

    let folder = outlier_folder(config, &username);
    let report = downloader(config, &graph)
        .download_posts(&outliers.posts, &folder)
        .await?;
    print_download_report(&report, &folder);
    write_json(&posts_snapshot_path(&folder, &username), &outliers.posts)?;

    let options = AnalysisOptions::from_app_config(config, results_path(&folder, &username));
    let summary = analyze_media_dir(
        &gemini,
        &folder,
        &outliers.posts,
        &report.child_order,
        &options,
    )
    .await?;
    print_analysis_summary(&summary);
    Ok(())
}

fn load_posts(path: &Path) -> anyhow::Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of posts", path.display()))
}

/// Analyze an existing media folder without touching the social-graph API.
///
/// # Errors
///
/// Returns an error if `GEMINI_API_KEY` is missing, the posts file cannot be
/// read, or the analysis stage fails outright.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    dir: &Path,
    posts_path: Option<&Path>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let gemini = inference_client(config)?;
    let posts = match posts_path {
        Some(path) => load_posts(path)?,
        None => Vec::new(),
    };
    let child_order = ChildOrder::from_posts(&posts);
    let output = output.unwrap_or_else(|| dir.join("analysis_results.json"));

    let options = AnalysisOptions::from_app_config(config, output);
    let summary = analyze_media_dir(&gemini, dir, &posts, &child_order, &options).await?;
    print_analysis_summary(&summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_compare_case_insensitively() {
        assert!(same_handle("Some.Brand", "some.brand"));
        assert!(same_handle("@some.brand", "some.brand"));
        assert!(!same_handle("some.brand", "other.brand"));
    }

    #[test]
    fn results_live_under_the_username_folder() {
        let folder = Path::new("outlier_media").join("some.brand");
        assert_eq!(
            results_path(&folder, "some.brand"),
            Path::new("outlier_media/some.brand/some.brand_outlier_media_results.json")
        );
        assert_eq!(
            posts_snapshot_path(&folder, "some.brand"),
            Path::new("outlier_media/some.brand/some.brand_posts.json")
        );
    }

    #[test]
    fn load_posts_reads_snapshot_written_by_outliers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("posts.json");
        std::fs::write(
            &path,
            r#"[{"id":"17900000001","caption":"hi","timestamp":null,"media_type":"IMAGE",
                "media_url":null,"thumbnail_url":null,"permalink":null,
                "metrics":{"likes":12},"children":[],"source":"owned"}]"#,
        )
        .expect("write posts");

        let posts = load_posts(&path).expect("posts should parse");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].metrics.likes, 12);
    }

    #[test]
    fn load_posts_rejects_non_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("posts.json");
        std::fs::write(&path, r#"{"not":"posts"}"#).expect("write posts");
        assert!(load_posts(&path).is_err());
    }
}
