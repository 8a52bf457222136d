//! In-depth report command handler.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use postlens_analysis::{generate_in_depth_report, ReportInputs};
use postlens_core::{AppConfig, RetryPolicy};

use crate::analyze::{inference_client, outlier_folder, results_path};

/// File arguments for `report`.
#[derive(Debug)]
pub(crate) struct ReportPaths {
    pub prompt: PathBuf,
    pub framework: PathBuf,
    pub banner_html: Option<PathBuf>,
    /// Defaults to the results written by `outliers` for the same username.
    pub results: Option<PathBuf>,
}

/// Resolve report inputs; the report lands next to the default results file.
pub(crate) fn report_inputs(
    config: &AppConfig,
    username: &str,
    paths: ReportPaths,
    banner_html: Option<String>,
) -> ReportInputs {
    let folder = outlier_folder(config, username);
    ReportInputs {
        prompt_path: paths.prompt,
        framework_path: paths.framework,
        results_path: paths
            .results
            .unwrap_or_else(|| results_path(&folder, username)),
        output_path: ReportInputs::default_output_path(&folder, username),
        banner_html,
        model: config.report_model.clone(),
    }
}

/// Generate the HTML report for a previous outlier run.
///
/// # Errors
///
/// Returns an error if `GEMINI_API_KEY` is missing, an input file cannot be
/// read, or the model call fails after retries.
pub(crate) async fn run_report(
    config: &AppConfig,
    username: &str,
    paths: ReportPaths,
) -> anyhow::Result<()> {
    let gemini = inference_client(config)?;
    let banner = match &paths.banner_html {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read banner {}", path.display()))?,
        ),
        None => None,
    };
    let username = username.trim_start_matches('@');
    let inputs = report_inputs(config, username, paths, banner);

    let retry = RetryPolicy::exponential(
        config.inference_max_attempts,
        Duration::from_millis(config.inference_backoff_base_ms),
    );
    let written = generate_in_depth_report(&gemini, &inputs, &retry).await?;
    println!("report written to {}", written.display());
    Ok(())
}
