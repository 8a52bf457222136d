use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub access_token: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub account_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub graph_base_url: String,
    pub graph_version: String,
    pub discovery_graph_version: String,
    pub inference_base_url: String,
    pub analysis_model: String,
    pub report_model: String,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub upload_concurrency: usize,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub inference_max_attempts: u32,
    pub inference_backoff_base_ms: u64,
    pub output_dir: PathBuf,
    pub media_dir: PathBuf,
    pub log_level: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .field("account_id", &self.account_id)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("graph_base_url", &self.graph_base_url)
            .field("graph_version", &self.graph_version)
            .field("discovery_graph_version", &self.discovery_graph_version)
            .field("inference_base_url", &self.inference_base_url)
            .field("analysis_model", &self.analysis_model)
            .field("report_model", &self.report_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("upload_concurrency", &self.upload_concurrency)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("inference_max_attempts", &self.inference_max_attempts)
            .field("inference_backoff_base_ms", &self.inference_backoff_base_ms)
            .field("output_dir", &self.output_dir)
            .field("media_dir", &self.media_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}
