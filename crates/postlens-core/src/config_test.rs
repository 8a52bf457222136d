use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_succeeds_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert!(cfg.access_token.is_none());
    assert!(cfg.account_id.is_none());
    assert!(cfg.gemini_api_key.is_none());
    assert_eq!(cfg.graph_base_url, "https://graph.facebook.com");
    assert_eq!(cfg.graph_version, "v19.0");
    assert_eq!(cfg.discovery_graph_version, "v24.0");
    assert_eq!(cfg.analysis_model, "gemini-2.5-flash");
    assert_eq!(cfg.report_model, "gemini-2.5-flash-lite");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.download_timeout_secs, 60);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 500);
    assert_eq!(cfg.upload_concurrency, 5);
    assert_eq!(cfg.poll_interval_ms, 2000);
    assert_eq!(cfg.poll_max_attempts, 20);
    assert_eq!(cfg.inference_max_attempts, 5);
    assert_eq!(cfg.inference_backoff_base_ms, 2000);
    assert_eq!(cfg.output_dir, PathBuf::from("outlier_media"));
    assert_eq!(cfg.media_dir, PathBuf::from("media"));
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn credentials_are_read_and_trimmed() {
    let mut map = HashMap::new();
    map.insert("ACCESS_TOKEN", "  EAAB-token \n");
    map.insert("IG_ACCOUNT_ID", "17841400000000000");
    map.insert("GEMINI_API_KEY", "gm-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.access_token.as_deref(), Some("EAAB-token"));
    assert_eq!(cfg.account_id.as_deref(), Some("17841400000000000"));
    assert_eq!(cfg.gemini_api_key.as_deref(), Some("gm-key"));
}

#[test]
fn blank_credentials_are_treated_as_missing() {
    let mut map = HashMap::new();
    map.insert("ACCESS_TOKEN", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.access_token.is_none());
}

#[test]
fn upload_concurrency_override() {
    let mut map = HashMap::new();
    map.insert("POSTLENS_UPLOAD_CONCURRENCY", "8");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.upload_concurrency, 8);
}

#[test]
fn upload_concurrency_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("POSTLENS_UPLOAD_CONCURRENCY", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTLENS_UPLOAD_CONCURRENCY"),
        "expected InvalidEnvVar(POSTLENS_UPLOAD_CONCURRENCY), got: {result:?}"
    );
}

#[test]
fn poll_max_attempts_invalid() {
    let mut map = HashMap::new();
    map.insert("POSTLENS_POLL_MAX_ATTEMPTS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTLENS_POLL_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(POSTLENS_POLL_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn inference_max_attempts_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("POSTLENS_INFERENCE_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTLENS_INFERENCE_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(POSTLENS_INFERENCE_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn request_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("POSTLENS_REQUEST_TIMEOUT_SECS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTLENS_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(POSTLENS_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn graph_endpoints_override() {
    let mut map = HashMap::new();
    map.insert("POSTLENS_GRAPH_BASE_URL", "http://127.0.0.1:9000");
    map.insert("POSTLENS_GRAPH_VERSION", "v21.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.graph_base_url, "http://127.0.0.1:9000");
    assert_eq!(cfg.graph_version, "v21.0");
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("ACCESS_TOKEN", "super-secret-token");
    map.insert("APP_SECRET", "app-secret");
    map.insert("GEMINI_API_KEY", "gm-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret-token"));
    assert!(!rendered.contains("app-secret"));
    assert!(!rendered.contains("gm-secret"));
    assert!(rendered.contains("[redacted]"));
}
