//! Media downloads to the local filesystem.
//!
//! Single-media posts are written as `<id>.<ext>`; carousel children as
//! `<parent>_<child>.<ext>`, which is the pattern carousel grouping keys on.
//! Per-file failures are logged and counted, never fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use postlens_core::{ChildOrder, MediaType, Post, RetryPolicy};

use crate::client::GraphClient;
use crate::error::GraphError;

const DOWNLOAD_CONCURRENCY: usize = 4;

/// Outcome of a batch download.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Paths written, in post order.
    pub saved: Vec<PathBuf>,
    /// Items with no resolvable URL.
    pub skipped: usize,
    /// Items whose fetch or write failed after retries.
    pub failed: usize,
    /// Carousel child order as reported by the API, keyed by parent id.
    pub child_order: ChildOrder,
}

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DownloadJob {
    url: String,
    file_name: String,
}

/// File name for a single-media post.
#[must_use]
pub fn media_file_name(media_id: &str, media_type: MediaType) -> String {
    format!("{media_id}.{}", media_type.file_extension())
}

/// File name for a carousel child.
#[must_use]
pub fn child_file_name(parent_id: &str, child_id: &str, media_type: MediaType) -> String {
    format!("{parent_id}_{child_id}.{}", media_type.file_extension())
}

/// Downloads post media through a [`GraphClient`], resolving missing URLs
/// and carousel children on the way.
pub struct MediaDownloader<'a> {
    graph: &'a GraphClient,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<'a> MediaDownloader<'a> {
    #[must_use]
    pub fn new(graph: &'a GraphClient, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            graph,
            timeout,
            retry,
        }
    }

    /// Downloads every post's media into `folder`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Io`] only if `folder` cannot be created. All
    /// per-item problems are reflected in the report counts instead.
    pub async fn download_posts(
        &self,
        posts: &[Post],
        folder: &Path,
    ) -> Result<DownloadReport, GraphError> {
        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|e| GraphError::Io {
                path: folder.display().to_string(),
                source: e,
            })?;

        let mut report = DownloadReport::default();
        let mut jobs: Vec<DownloadJob> = Vec::new();

        for (idx, post) in posts.iter().enumerate() {
            if post.is_carousel() {
                let children = self.resolve_children(post).await;
                if children.is_empty() {
                    tracing::warn!(media_id = %post.id, "no children found for carousel; skipping");
                    report.skipped += 1;
                    continue;
                }
                report
                    .child_order
                    .insert(&post.id, children.iter().map(|c| c.id.clone()).collect());
                for child in children {
                    match child.media_url {
                        Some(url) => jobs.push(DownloadJob {
                            url,
                            file_name: child_file_name(&post.id, &child.id, child.media_type),
                        }),
                        None => {
                            tracing::warn!(media_id = %post.id, child_id = %child.id, "child has no media_url; skipping");
                            report.skipped += 1;
                        }
                    }
                }
                continue;
            }

            match self.resolve_single(post).await {
                Some((url, media_type)) => jobs.push(DownloadJob {
                    url,
                    file_name: media_file_name(&post.id, media_type),
                }),
                None => {
                    tracing::warn!(
                        progress = %format!("{}/{}", idx + 1, posts.len()),
                        media_id = %post.id,
                        "post has no media_url; skipping"
                    );
                    report.skipped += 1;
                }
            }
        }

        let results: Vec<(String, Result<PathBuf, GraphError>)> = stream::iter(jobs)
            .map(|job| async move {
                let path = folder.join(&job.file_name);
                let outcome = self.fetch_to_file(&job.url, &path).await.map(|()| path);
                (job.file_name, outcome)
            })
            .buffered(DOWNLOAD_CONCURRENCY)
            .collect()
            .await;

        for (file_name, outcome) in results {
            match outcome {
                Ok(path) => {
                    tracing::info!(file = %file_name, "downloaded");
                    report.saved.push(path);
                }
                Err(e) => {
                    tracing::warn!(file = %file_name, error = %e, "download failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            saved = report.saved.len(),
            skipped = report.skipped,
            failed = report.failed,
            folder = %folder.display(),
            "media download complete"
        );
        Ok(report)
    }

    /// Inline children when they all carry URLs; otherwise a fresh lookup,
    /// keeping the inline list if the lookup finds nothing.
    async fn resolve_children(&self, post: &Post) -> Vec<postlens_core::CarouselChild> {
        let complete = !post.children.is_empty()
            && post.children.iter().all(|c| c.media_url.is_some());
        if complete {
            return post.children.clone();
        }
        let fetched = self.graph.fetch_children(&post.id).await;
        if fetched.is_empty() {
            post.children.clone()
        } else {
            fetched
        }
    }

    async fn resolve_single(&self, post: &Post) -> Option<(String, MediaType)> {
        if let Some(url) = post.display_url() {
            return Some((url.to_owned(), post.media_type));
        }
        match self.graph.fetch_child(&post.id).await {
            Ok(resolved) => {
                let media_type = if post.media_type == MediaType::Unknown {
                    resolved.media_type
                } else {
                    post.media_type
                };
                resolved.media_url.map(|url| (url, media_type))
            }
            Err(e) => {
                tracing::warn!(media_id = %post.id, error = %e, "media_url lookup failed");
                None
            }
        }
    }

    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<(), GraphError> {
        let bytes = postlens_core::retry(&self.retry, GraphError::is_retriable, || async move {
            let response = self
                .graph
                .http()
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| GraphError::Http(e.without_url()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(GraphError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.split('?').next().unwrap_or(url).to_owned(),
                });
            }
            response
                .bytes()
                .await
                .map_err(|e| GraphError::Http(e.without_url()))
        })
        .await?;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| GraphError::Io {
                path: path.display().to_string(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_media_names_use_type_extension() {
        assert_eq!(media_file_name("123", MediaType::Image), "123.jpg");
        assert_eq!(media_file_name("123", MediaType::Reel), "123.mp4");
        assert_eq!(media_file_name("123", MediaType::Unknown), "123.jpg");
    }

    #[test]
    fn child_names_join_parent_and_child() {
        assert_eq!(
            child_file_name("17900", "17901", MediaType::Video),
            "17900_17901.mp4"
        );
    }
}
