use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are all optional here: each command checks for the ones it
/// needs and reports a user-facing error, so `postlens --help` and offline
/// commands work without a populated `.env`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let at_least_one = |var: &str, is_zero: bool| -> Result<(), ConfigError> {
        if is_zero {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    };

    let access_token = optional("ACCESS_TOKEN");
    let app_id = optional("APP_ID");
    let app_secret = optional("APP_SECRET");
    let account_id = optional("IG_ACCOUNT_ID");
    let gemini_api_key = optional("GEMINI_API_KEY");

    let graph_base_url = or_default("POSTLENS_GRAPH_BASE_URL", "https://graph.facebook.com");
    let graph_version = or_default("POSTLENS_GRAPH_VERSION", "v19.0");
    let discovery_graph_version = or_default("POSTLENS_DISCOVERY_GRAPH_VERSION", "v24.0");
    let inference_base_url = or_default(
        "POSTLENS_INFERENCE_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let analysis_model = or_default("POSTLENS_ANALYSIS_MODEL", "gemini-2.5-flash");
    let report_model = or_default("POSTLENS_REPORT_MODEL", "gemini-2.5-flash-lite");

    let request_timeout_secs = parse_u64("POSTLENS_REQUEST_TIMEOUT_SECS", "30")?;
    let download_timeout_secs = parse_u64("POSTLENS_DOWNLOAD_TIMEOUT_SECS", "60")?;
    let user_agent = or_default("POSTLENS_USER_AGENT", "postlens/0.1 (social-analytics)");
    let max_retries = parse_u32("POSTLENS_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("POSTLENS_RETRY_BACKOFF_BASE_MS", "500")?;

    let upload_concurrency = parse_usize("POSTLENS_UPLOAD_CONCURRENCY", "5")?;
    at_least_one("POSTLENS_UPLOAD_CONCURRENCY", upload_concurrency == 0)?;
    let poll_interval_ms = parse_u64("POSTLENS_POLL_INTERVAL_MS", "2000")?;
    let poll_max_attempts = parse_u32("POSTLENS_POLL_MAX_ATTEMPTS", "20")?;
    at_least_one("POSTLENS_POLL_MAX_ATTEMPTS", poll_max_attempts == 0)?;
    let inference_max_attempts = parse_u32("POSTLENS_INFERENCE_MAX_ATTEMPTS", "5")?;
    at_least_one("POSTLENS_INFERENCE_MAX_ATTEMPTS", inference_max_attempts == 0)?;
    let inference_backoff_base_ms = parse_u64("POSTLENS_INFERENCE_BACKOFF_BASE_MS", "2000")?;

    let output_dir = PathBuf::from(or_default("POSTLENS_OUTPUT_DIR", "outlier_media"));
    let media_dir = PathBuf::from(or_default("POSTLENS_MEDIA_DIR", "media"));
    let log_level = or_default("POSTLENS_LOG_LEVEL", "info");

    Ok(AppConfig {
        access_token,
        app_id,
        app_secret,
        account_id,
        gemini_api_key,
        graph_base_url,
        graph_version,
        discovery_graph_version,
        inference_base_url,
        analysis_model,
        report_model,
        request_timeout_secs,
        download_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        upload_concurrency,
        poll_interval_ms,
        poll_max_attempts,
        inference_max_attempts,
        inference_backoff_base_ms,
        output_dir,
        media_dir,
        log_level,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
