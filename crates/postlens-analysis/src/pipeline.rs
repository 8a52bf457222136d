//! End-to-end analysis of one media directory.
//!
//! group → prepare → upload → poll → single inference call → salvage →
//! merge → cleanup → write results. Uploaded files are deleted whether or
//! not inference succeeds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use postlens_core::{AppConfig, ChildOrder, Post, RetryPolicy};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::grouping::group_media;
use crate::merge::merge_results;
use crate::prepare::prepare_media;
use crate::prompt::{build_analysis_prompt, ManifestEntry};
use crate::salvage::{invalid_output_placeholder, salvage_entries};
use crate::staging::{await_active, cleanup, upload_all};
use crate::store::{FileStore, Generator, RemoteFile};

/// Tuning for [`analyze_media_dir`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub model: String,
    /// Worker-pool size for upload, poll, and delete.
    pub concurrency: usize,
    /// Activation poll schedule.
    pub poll: RetryPolicy,
    /// Retry schedule for the inference call on overload.
    pub inference: RetryPolicy,
    /// Where the results JSON is written.
    pub output_path: PathBuf,
}

impl AnalysisOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, output_path: PathBuf) -> Self {
        Self {
            model: config.analysis_model.clone(),
            concurrency: config.upload_concurrency,
            poll: RetryPolicy::constant(
                config.poll_max_attempts,
                Duration::from_millis(config.poll_interval_ms),
            ),
            inference: RetryPolicy::exponential(
                config.inference_max_attempts,
                Duration::from_millis(config.inference_backoff_base_ms),
            ),
            output_path,
        }
    }
}

/// Counts from one run plus the written entries.
#[derive(Debug)]
pub struct AnalysisSummary {
    pub groups: usize,
    pub prepared: usize,
    pub uploaded: usize,
    pub active: usize,
    pub deleted: usize,
    /// `false` when the model output could not be parsed and the placeholder
    /// was written instead.
    pub parsed: bool,
    pub entries: Vec<Value>,
    pub output_path: PathBuf,
}

/// Regular file names directly inside `dir`.
async fn list_file_names(dir: &Path) -> Result<Vec<String>, AnalysisError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AnalysisError::io(dir, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AnalysisError::io(dir, e))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Analyzes every media file in `dir` and writes merged results to
/// `options.output_path`.
///
/// `posts` supplies metadata for the merge; `child_order` orders carousel
/// pages. When no file becomes active the model is not called and an empty
/// array is written.
///
/// # Errors
///
/// Returns [`AnalysisError::Io`] if the directory cannot be read or the
/// results cannot be written, and the inference error once its retry budget
/// is spent. Per-file upload, poll, and delete failures are not errors.
pub async fn analyze_media_dir<C>(
    client: &C,
    dir: &Path,
    posts: &[Post],
    child_order: &ChildOrder,
    options: &AnalysisOptions,
) -> Result<AnalysisSummary, AnalysisError>
where
    C: FileStore + Generator + ?Sized,
{
    let names = list_file_names(dir).await?;
    let groups = group_media(&names, child_order);
    tracing::info!(groups = groups.len(), dir = %dir.display(), "media grouped");

    let prepared = prepare_media(dir, &groups).await;
    let prepared_count = prepared.len();
    tracing::info!(files = prepared_count, "ready to upload");

    let staged = upload_all(client, prepared, options.concurrency).await;
    let uploaded = staged.len();
    let activation = await_active(client, staged, &options.poll, options.concurrency).await;
    let active = activation.active.len();

    let inference = if activation.active.is_empty() {
        tracing::warn!("no active files; skipping inference");
        Ok(None)
    } else {
        let manifest: Vec<ManifestEntry> = activation
            .active
            .iter()
            .map(|s| ManifestEntry {
                file_name: s.media.file_name(),
                media_id: s.media.media_id.clone(),
            })
            .collect();
        let prompt = build_analysis_prompt(&manifest);
        let remote: Vec<RemoteFile> = activation.active.iter().map(|s| s.remote.clone()).collect();
        tracing::info!(files = remote.len(), model = %options.model, "invoking model once");
        postlens_core::retry(&options.inference, AnalysisError::is_overload, || {
            client.generate(&options.model, &remote, &prompt)
        })
        .await
        .map(Some)
    };

    let deleted = cleanup(client, activation.all_names(), options.concurrency).await;
    let raw = inference?;

    let (entries, parsed) = match raw {
        None => (Vec::new(), true),
        Some(text) => match salvage_entries(&text) {
            Some(entries) => {
                let manifest_ids: Vec<String> = activation
                    .active
                    .iter()
                    .map(|s| s.media.media_id.clone())
                    .collect();
                let merged = merge_results(entries, &manifest_ids, posts);
                let values = merged
                    .into_iter()
                    .map(|m| {
                        serde_json::to_value(m).map_err(|e| AnalysisError::Json {
                            context: "merged entry".to_owned(),
                            source: e,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (values, true)
            }
            None => {
                tracing::warn!("model output is not a JSON array; writing placeholder");
                (invalid_output_placeholder(), false)
            }
        },
    };

    write_results(&options.output_path, &entries).await?;
    tracing::info!(
        entries = entries.len(),
        output = %options.output_path.display(),
        "analysis complete"
    );

    Ok(AnalysisSummary {
        groups: groups.len(),
        prepared: prepared_count,
        uploaded,
        active,
        deleted,
        parsed,
        entries,
        output_path: options.output_path.clone(),
    })
}

async fn write_results(path: &Path, entries: &[Value]) -> Result<(), AnalysisError> {
    let body = serde_json::to_string_pretty(entries).map_err(|e| AnalysisError::Json {
        context: "results".to_owned(),
        source: e,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AnalysisError::io(parent, e))?;
    }
    tokio::fs::write(path, body)
        .await
        .map_err(|e| AnalysisError::io(path, e))
}
