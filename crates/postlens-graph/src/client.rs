//! HTTP client for the social-graph API.
//!
//! Wraps `reqwest` with token handling, versioned URL construction, error
//! envelope detection, and retry on transient failures. Endpoint groups live
//! in sibling modules as further `impl GraphClient` blocks.

use std::time::Duration;

use postlens_core::{AppConfig, RetryPolicy};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::GraphError;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Construction parameters for [`GraphClient`].
#[derive(Debug, Clone)]
pub struct GraphClientOptions {
    pub base_url: String,
    /// API version for owned-content endpoints, e.g. `"v19.0"`.
    pub version: String,
    /// API version for business discovery, which needs newer fields.
    pub discovery_version: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for GraphClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            version: "v19.0".to_owned(),
            discovery_version: "v24.0".to_owned(),
            timeout_secs: 30,
            user_agent: "postlens/0.1 (social-analytics)".to_owned(),
            retry: RetryPolicy::exponential(4, Duration::from_millis(500)).with_jitter(),
        }
    }
}

impl GraphClientOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.graph_base_url.clone(),
            version: config.graph_version.clone(),
            discovery_version: config.discovery_graph_version.clone(),
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            retry: RetryPolicy::exponential(
                config.max_retries.saturating_add(1),
                Duration::from_millis(config.retry_backoff_base_ms),
            )
            .with_jitter(),
        }
    }
}

/// Client for the social-graph API, bound to one access token.
pub struct GraphClient {
    client: Client,
    access_token: String,
    base_url: Url,
    pub(crate) version: String,
    pub(crate) discovery_version: String,
    retry: RetryPolicy,
}

impl GraphClient {
    /// Creates a client for `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GraphError::InvalidUrl`] if
    /// `options.base_url` does not parse.
    pub fn new(access_token: &str, options: &GraphClientOptions) -> Result<Self, GraphError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()?;

        // A trailing slash makes `Url::join` append rather than replace the
        // last path segment.
        let normalised = format!("{}/", options.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| GraphError::InvalidUrl(format!("{}: {e}", options.base_url)))?;

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            base_url,
            version: options.version.clone(),
            discovery_version: options.discovery_version.clone(),
            retry: options.retry,
        })
    }

    /// Creates a client with default options pointed at `base_url` (for
    /// testing with wiremock). Retries are disabled.
    ///
    /// # Errors
    ///
    /// Same as [`GraphClient::new`].
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self, GraphError> {
        let options = GraphClientOptions {
            base_url: base_url.to_owned(),
            retry: RetryPolicy::none(),
            ..GraphClientOptions::default()
        };
        Self::new(access_token, &options)
    }

    /// Underlying HTTP client, shared with the media downloader.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Builds `{base}/{version}/{path}?access_token=…&{extra}` with the
    /// client's own token.
    pub(crate) fn build_url(
        &self,
        version: &str,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<Url, GraphError> {
        self.build_url_with_token(version, path, &self.access_token, extra)
    }

    /// Like [`Self::build_url`] but with an explicit token (the app token for
    /// `debug_token`).
    pub(crate) fn build_url_with_token(
        &self,
        version: &str,
        path: &str,
        token: &str,
        extra: &[(&str, &str)],
    ) -> Result<Url, GraphError> {
        let mut url = self
            .base_url
            .join(&format!("{version}/{}", path.trim_start_matches('/')))
            .map_err(|e| GraphError::InvalidUrl(format!("{path}: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("access_token", token);
        }
        Ok(url)
    }

    /// GETs `url` with retry and deserializes the body into `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, GraphError> {
        let body = self.request_json(url).await?;
        serde_json::from_value(body).map_err(|e| GraphError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// GETs `url`, retrying transient failures per the client's policy.
    pub(crate) async fn request_json(&self, url: &Url) -> Result<serde_json::Value, GraphError> {
        postlens_core::retry(&self.retry, GraphError::is_retriable, || {
            self.request_once(url)
        })
        .await
    }

    async fn request_once(&self, url: &Url) -> Result<serde_json::Value, GraphError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GraphError::Http(e.without_url()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GraphError::Http(e.without_url()))?;

        let parsed = serde_json::from_str::<serde_json::Value>(&text);
        if let Ok(body) = &parsed {
            if let Some(err) = Self::api_error(status.as_u16(), body) {
                return Err(err);
            }
        }

        if !status.is_success() {
            return Err(GraphError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact(url),
            });
        }

        parsed.map_err(|e| GraphError::Deserialize {
            context: redact(url),
            source: e,
        })
    }

    /// Extracts the `{"error": {...}}` envelope, if present.
    fn api_error(status: u16, body: &serde_json::Value) -> Option<GraphError> {
        let err = body.get("error")?;
        if !err.is_object() {
            return None;
        }
        Some(GraphError::Api {
            status,
            code: err
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default(),
            kind: err
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_owned(),
            message: err
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_owned(),
        })
    }
}

/// URL without its query string, safe to log or embed in errors.
pub(crate) fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}
