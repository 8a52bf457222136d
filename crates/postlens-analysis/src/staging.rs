//! Bounded-concurrency upload, activation polling, and cleanup against a
//! [`FileStore`].
//!
//! Each task returns its own result; results are collected after the stream
//! drains and sorted by media id, so nothing downstream depends on which
//! request finished first.

use futures::stream::{self, StreamExt};
use postlens_core::RetryPolicy;

use crate::error::AnalysisError;
use crate::prepare::PreparedMedia;
use crate::store::{FileState, FileStore, RemoteFile};

/// A prepared file and its remote handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub media: PreparedMedia,
    pub remote: RemoteFile,
}

/// Result of waiting for uploads to finish processing.
#[derive(Debug, Default)]
pub struct Activation {
    /// Ready for inference.
    pub active: Vec<StagedFile>,
    /// Failed or timed out; still need deleting.
    pub inactive: Vec<StagedFile>,
}

impl Activation {
    /// Remote names of every uploaded file, active or not.
    #[must_use]
    pub fn all_names(&self) -> Vec<String> {
        self.active
            .iter()
            .chain(&self.inactive)
            .map(|s| s.remote.name.clone())
            .collect()
    }
}

fn sort_staged(files: &mut [StagedFile]) {
    files.sort_by(|a, b| {
        (a.media.media_id.as_str(), a.media.group_key.as_str())
            .cmp(&(b.media.media_id.as_str(), b.media.group_key.as_str()))
    });
}

/// Uploads `items` with at most `concurrency` requests in flight. Failed
/// uploads are logged and excluded; they are not retried.
pub async fn upload_all<S>(
    store: &S,
    items: Vec<PreparedMedia>,
    concurrency: usize,
) -> Vec<StagedFile>
where
    S: FileStore + ?Sized,
{
    let total = items.len();
    let mut staged: Vec<StagedFile> = stream::iter(items)
        .map(|media| async move {
            let mime_type = media.mime_type();
            match store.upload(&media.path, &mime_type).await {
                Ok(remote) => {
                    tracing::info!(file = %media.file_name(), remote = %remote.name, "uploaded");
                    Some(StagedFile { media, remote })
                }
                Err(e) => {
                    tracing::warn!(file = %media.file_name(), error = %e, "upload failed; skipping");
                    None
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    sort_staged(&mut staged);
    tracing::info!(uploaded = staged.len(), total, "upload stage complete");
    staged
}

/// Polls one file until it is active.
///
/// # Errors
///
/// Returns [`AnalysisError::FileFailed`] as soon as the store reports a
/// failure, [`AnalysisError::NotActive`] once `policy` is exhausted, or any
/// error from the status call itself.
pub async fn wait_until_active<S>(
    store: &S,
    name: &str,
    policy: &RetryPolicy,
) -> Result<RemoteFile, AnalysisError>
where
    S: FileStore + ?Sized,
{
    let outcome = postlens_core::retry(policy, AnalysisError::is_pending, || async move {
        let file = store.status(name).await?;
        match file.state {
            FileState::Active => Ok(file),
            FileState::Failed => Err(AnalysisError::FileFailed {
                name: name.to_owned(),
            }),
            FileState::Processing => Err(AnalysisError::Processing {
                name: name.to_owned(),
            }),
        }
    })
    .await;

    match outcome {
        Err(AnalysisError::Processing { name }) => Err(AnalysisError::NotActive {
            name,
            attempts: policy.max_attempts.max(1),
        }),
        other => other,
    }
}

/// Waits for every staged file to become active. One file failing or timing
/// out does not affect the others.
pub async fn await_active<S>(
    store: &S,
    staged: Vec<StagedFile>,
    policy: &RetryPolicy,
    concurrency: usize,
) -> Activation
where
    S: FileStore + ?Sized,
{
    let outcomes: Vec<(StagedFile, Result<RemoteFile, AnalysisError>)> = stream::iter(staged)
        .map(|file| async move {
            if file.remote.state == FileState::Active {
                let remote = file.remote.clone();
                return (file, Ok(remote));
            }
            let outcome = wait_until_active(store, &file.remote.name, policy).await;
            (file, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut activation = Activation::default();
    for (mut file, outcome) in outcomes {
        match outcome {
            Ok(remote) => {
                tracing::info!(file = %file.media.file_name(), "file is ACTIVE");
                file.remote = remote;
                activation.active.push(file);
            }
            Err(e) => {
                tracing::warn!(file = %file.media.file_name(), error = %e, "activation failed");
                activation.inactive.push(file);
            }
        }
    }
    sort_staged(&mut activation.active);
    sort_staged(&mut activation.inactive);
    activation
}

/// Deletes `names` in parallel. Failures are logged, never retried, and
/// never returned. Returns how many deletions succeeded.
pub async fn cleanup<S>(store: &S, names: Vec<String>, concurrency: usize) -> usize
where
    S: FileStore + ?Sized,
{
    let results: Vec<bool> = stream::iter(names)
        .map(|name| async move {
            match store.delete(&name).await {
                Ok(()) => {
                    tracing::debug!(remote = %name, "deleted");
                    true
                }
                Err(e) => {
                    tracing::warn!(remote = %name, error = %e, "could not delete uploaded file");
                    false
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    let deleted = results.iter().filter(|ok| **ok).count();
    tracing::info!(deleted, attempted = results.len(), "cleanup complete");
    deleted
}

#[cfg(test)]
#[path = "staging_test.rs"]
mod tests;
