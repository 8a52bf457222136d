use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network or TLS failure. The request URL is stripped before wrapping
    /// because it carries the API key.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The inference service signalled overload (HTTP 503).
    #[error("inference service overloaded: {0}")]
    Overloaded(String),

    #[error("inference API error [HTTP {status}]: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("upload session for {path} returned no upload URL")]
    MissingUploadUrl { path: String },

    #[error("{name} failed to process")]
    FileFailed { name: String },

    /// One poll saw the file still processing.
    #[error("{name} is still processing")]
    Processing { name: String },

    #[error("{name} did not become ACTIVE after {attempts} polls")]
    NotActive { name: String, attempts: u32 },

    #[error("model response contained no text")]
    EmptyResponse,

    #[error("image error for {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("nothing to merge: {0}")]
    EmptyInput(String),
}

impl AnalysisError {
    /// `true` only for overload, the one condition the inference call is
    /// retried on.
    #[must_use]
    pub fn is_overload(&self) -> bool {
        matches!(self, Self::Overloaded(_))
    }

    /// `true` while a file is still being processed remotely.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_overload_is_retried_for_inference() {
        assert!(AnalysisError::Overloaded("503".into()).is_overload());
        assert!(!AnalysisError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_overload());
        assert!(!AnalysisError::EmptyResponse.is_overload());
    }

    #[test]
    fn failed_file_is_not_pending() {
        assert!(!AnalysisError::FileFailed { name: "files/a".into() }.is_pending());
        assert!(AnalysisError::Processing { name: "files/a".into() }.is_pending());
        assert!(!AnalysisError::NotActive {
            name: "files/a".into(),
            attempts: 1
        }
        .is_pending());
    }
}
