//! Turns media groups into the files that are actually uploaded.

use std::path::{Path, PathBuf};

use crate::grouping::MediaGroup;
use crate::pdf::merge_images_to_pdf;

/// One upload unit with the post id it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMedia {
    pub media_id: String,
    pub group_key: String,
    pub path: PathBuf,
}

impl PreparedMedia {
    /// File name shown to the model in the prompt manifest.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// MIME type guessed from the extension.
    #[must_use]
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned()
    }
}

/// Multi-image groups are merged to `<dir>/<key>.pdf`; every other group
/// passes its first file through. A group whose merge fails is logged and
/// dropped.
pub async fn prepare_media(dir: &Path, groups: &[MediaGroup]) -> Vec<PreparedMedia> {
    let mut prepared = Vec::with_capacity(groups.len());
    for group in groups {
        let Some(first) = group.files.first() else {
            continue;
        };
        if !group.needs_merge() {
            prepared.push(PreparedMedia {
                media_id: group.media_id.clone(),
                group_key: group.key.clone(),
                path: dir.join(first),
            });
            continue;
        }

        let images: Vec<PathBuf> = group.files.iter().map(|f| dir.join(f)).collect();
        let output = dir.join(format!("{}.pdf", group.key));
        match merge_images_to_pdf(images, output).await {
            Ok(path) => {
                tracing::info!(group = %group.key, pages = group.files.len(), "merged carousel into PDF");
                prepared.push(PreparedMedia {
                    media_id: group.media_id.clone(),
                    group_key: group.key.clone(),
                    path,
                });
            }
            Err(e) => {
                tracing::warn!(group = %group.key, error = %e, "carousel merge failed; skipping group");
            }
        }
    }
    prepared
}
