//! Seams to the hosted file store and the generative model.
//!
//! [`crate::GeminiClient`] implements both; tests substitute in-memory fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AnalysisError;

/// Remote processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Processing,
    Active,
    Failed,
}

impl FileState {
    /// Parses a wire state. Unrecognized values are treated as still
    /// processing so the poll budget decides.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            "FAILED" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// Handle to a file held by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Store-assigned resource name, e.g. `files/abc123`.
    pub name: String,
    /// URI passed to the model.
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

/// Upload, status, and delete against a hosted file store.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<RemoteFile, AnalysisError>;

    /// Current state of `name`.
    async fn status(&self, name: &str) -> Result<RemoteFile, AnalysisError>;

    async fn delete(&self, name: &str) -> Result<(), AnalysisError>;
}

/// One generation call over a set of files plus a text prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model's text output.
    async fn generate(
        &self,
        model: &str,
        files: &[RemoteFile],
        prompt: &str,
    ) -> Result<String, AnalysisError>;
}
