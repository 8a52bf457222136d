use thiserror::Error;

/// Errors returned by the social-graph API client.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Network or TLS failure from the underlying HTTP client. The request
    /// URL is stripped before wrapping so access tokens never reach logs.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an `{"error": {...}}` envelope.
    #[error("API error {code} ({kind}) [HTTP {status}]: {message}")]
    Api {
        status: u16,
        code: i64,
        kind: String,
        message: String,
    },

    /// Non-2xx response without a parseable error envelope.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    #[error("no business accounts found in the token's granular scopes; check permissions")]
    NoAccounts,

    #[error("business discovery returned no data for {username}; likely missing permissions")]
    DiscoveryUnavailable { username: String },

    #[error("pagination limit reached for {context}: exceeded {max_pages} pages")]
    PaginationLimit { context: String, max_pages: usize },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// API error codes the platform documents as temporary or throttling
/// conditions.
const TRANSIENT_API_CODES: &[i64] = &[1, 2, 4, 17, 32, 341, 613];

impl GraphError {
    /// `true` for failures worth retrying after a back-off delay.
    ///
    /// - Network timeouts and connection failures.
    /// - HTTP 5xx and 429.
    /// - API envelopes carrying a throttling/temporary error code.
    ///
    /// Everything else (bad permissions, malformed payloads, I/O) fails fast.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::Api { status, code, .. } => {
                *status >= 500 || *status == 429 || TRANSIENT_API_CODES.contains(code)
            }
            Self::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Deserialize { .. }
            | Self::InvalidUrl(_)
            | Self::InvalidUsername(_)
            | Self::NoAccounts
            | Self::DiscoveryUnavailable { .. }
            | Self::PaginationLimit { .. }
            | Self::Io { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: i64) -> GraphError {
        GraphError::Api {
            status,
            code,
            kind: "OAuthException".to_owned(),
            message: "test".to_owned(),
        }
    }

    #[test]
    fn throttling_codes_are_retriable() {
        assert!(api(400, 4).is_retriable());
        assert!(api(400, 17).is_retriable());
        assert!(api(400, 613).is_retriable());
    }

    #[test]
    fn permission_errors_are_not_retriable() {
        assert!(!api(400, 10).is_retriable());
        assert!(!api(400, 190).is_retriable());
    }

    #[test]
    fn server_errors_are_retriable() {
        assert!(api(503, 100).is_retriable());
        assert!(GraphError::UnexpectedStatus {
            status: 502,
            url: "x".to_owned()
        }
        .is_retriable());
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!GraphError::UnexpectedStatus {
            status: 404,
            url: "x".to_owned()
        }
        .is_retriable());
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        assert!(!GraphError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
        .is_retriable());
    }
}
