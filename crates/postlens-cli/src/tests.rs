use std::path::{Path, PathBuf};

use postlens_core::AppConfig;

use super::*;

fn offline_config() -> AppConfig {
    AppConfig {
        access_token: None,
        app_id: None,
        app_secret: None,
        account_id: None,
        gemini_api_key: None,
        graph_base_url: "http://127.0.0.1:9".to_string(),
        graph_version: "v19.0".to_string(),
        discovery_graph_version: "v24.0".to_string(),
        inference_base_url: "http://127.0.0.1:9".to_string(),
        analysis_model: "gemini-2.5-flash".to_string(),
        report_model: "gemini-2.5-flash-lite".to_string(),
        request_timeout_secs: 5,
        download_timeout_secs: 5,
        user_agent: "postlens-test".to_string(),
        max_retries: 0,
        retry_backoff_base_ms: 1,
        upload_concurrency: 2,
        poll_interval_ms: 1,
        poll_max_attempts: 1,
        inference_max_attempts: 1,
        inference_backoff_base_ms: 1,
        output_dir: PathBuf::from("outlier_media"),
        media_dir: PathBuf::from("media"),
        log_level: "info".to_string(),
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["postlens"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(cli.account.is_none());
}

#[test]
fn parses_accounts_command() {
    let cli = Cli::try_parse_from(["postlens", "accounts"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Accounts)));
}

#[test]
fn account_flag_is_global() {
    let cli = Cli::try_parse_from(["postlens", "insights", "--account", "17841400000000000"])
        .expect("expected valid cli args");
    assert_eq!(cli.account.as_deref(), Some("17841400000000000"));
}

#[test]
fn insights_defaults_count_and_output() {
    let cli = Cli::try_parse_from(["postlens", "insights"]).expect("expected valid cli args");
    match cli.command {
        Some(Commands::Insights { count, output }) => {
            assert_eq!(count, 25);
            assert_eq!(output, PathBuf::from("instagram_insights.json"));
        }
        other => panic!("expected insights, got {other:?}"),
    }
}

#[test]
fn zero_count_is_rejected() {
    let result = Cli::try_parse_from(["postlens", "insights", "--count", "0"]);
    assert!(result.is_err());
}

#[test]
fn account_insights_collects_repeated_metrics() {
    let cli = Cli::try_parse_from([
        "postlens",
        "account-insights",
        "--period",
        "week",
        "--metric",
        "reach",
        "--metric",
        "follower_count",
        "--since",
        "1700000000",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::AccountInsights {
            period,
            since,
            until,
            preset,
            metrics,
            ..
        }) => {
            assert_eq!(period, "week");
            assert_eq!(since, Some(1_700_000_000));
            assert!(until.is_none());
            assert!(preset.is_none());
            assert_eq!(metrics, vec!["reach", "follower_count"]);
        }
        other => panic!("expected account-insights, got {other:?}"),
    }
}

#[test]
fn account_insights_query_falls_back_to_default_metrics() {
    let query = graph::account_insights_query("day".to_string(), None, None, None, Vec::new());
    assert!(!query.metrics.is_empty());
    assert_eq!(
        query.metrics,
        postlens_graph::AccountInsightsQuery::default().metrics
    );
}

#[test]
fn account_insights_query_drops_blank_preset() {
    let query = graph::account_insights_query(
        "day".to_string(),
        None,
        None,
        Some("  ".to_string()),
        vec!["reach".to_string()],
    );
    assert!(query.date_preset.is_none());
    assert_eq!(query.metrics, vec!["reach"]);
}

#[test]
fn parses_download_with_folder() {
    let cli = Cli::try_parse_from(["postlens", "download", "--count", "3", "--folder", "out"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Download { count: 3, folder: Some(_) })
    ));
}

#[test]
fn parses_discover_with_download_flag() {
    let cli = Cli::try_parse_from([
        "postlens",
        "discover",
        "https://www.instagram.com/some.brand/",
        "--download",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Discover {
            profile,
            count,
            output,
            download,
            folder,
        }) => {
            assert_eq!(profile, "https://www.instagram.com/some.brand/");
            assert_eq!(count, 10);
            assert!(output.is_none());
            assert!(download);
            assert!(folder.is_none());
        }
        other => panic!("expected discover, got {other:?}"),
    }
}

#[test]
fn discover_requires_profile() {
    assert!(Cli::try_parse_from(["postlens", "discover"]).is_err());
}

#[test]
fn discover_output_defaults_to_username() {
    assert_eq!(
        graph::discover_output_path("some.brand"),
        PathBuf::from("some.brand_insights.json")
    );
}

#[test]
fn parses_outliers_with_multiplier() {
    let cli = Cli::try_parse_from([
        "postlens",
        "outliers",
        "some.brand",
        "--count",
        "40",
        "--multiplier",
        "1.5",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Outliers {
            username,
            count,
            multiplier,
        }) => {
            assert_eq!(username, "some.brand");
            assert_eq!(count, 40);
            assert!((multiplier - 1.5).abs() < f64::EPSILON);
        }
        other => panic!("expected outliers, got {other:?}"),
    }
}

#[test]
fn non_positive_multiplier_is_rejected() {
    for bad in ["0", "-1", "nan", "abc"] {
        let result = Cli::try_parse_from(["postlens", "outliers", "x", "--multiplier", bad]);
        assert!(result.is_err(), "multiplier {bad} should be rejected");
    }
}

#[test]
fn parses_analyze_command() {
    let cli = Cli::try_parse_from([
        "postlens",
        "analyze",
        "--dir",
        "outlier_media/some.brand",
        "--posts",
        "outlier_media/some.brand/some.brand_posts.json",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Analyze { dir, posts, output }) => {
            assert_eq!(dir, PathBuf::from("outlier_media/some.brand"));
            assert!(posts.is_some());
            assert!(output.is_none());
        }
        other => panic!("expected analyze, got {other:?}"),
    }
}

#[test]
fn analyze_requires_dir() {
    assert!(Cli::try_parse_from(["postlens", "analyze"]).is_err());
}

#[test]
fn parses_report_command() {
    let cli = Cli::try_parse_from([
        "postlens",
        "report",
        "some.brand",
        "--prompt",
        "prompt.txt",
        "--framework",
        "framework.md",
        "--banner-html",
        "banner.html",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            banner_html: Some(_),
            results: None,
            ..
        })
    ));
}

#[test]
fn report_requires_prompt_and_framework() {
    assert!(Cli::try_parse_from(["postlens", "report", "some.brand", "--prompt", "p.txt"]).is_err());
}

#[test]
fn report_inputs_default_to_outlier_run_paths() {
    let config = offline_config();
    let paths = report::ReportPaths {
        prompt: PathBuf::from("prompt.txt"),
        framework: PathBuf::from("framework.md"),
        banner_html: None,
        results: None,
    };
    let inputs = report::report_inputs(&config, "some.brand", paths, None);

    assert_eq!(
        inputs.results_path,
        Path::new("outlier_media/some.brand/some.brand_outlier_media_results.json")
    );
    assert_eq!(
        inputs.output_path,
        Path::new("outlier_media/some.brand/some.brand_in_depth_report.html")
    );
    assert_eq!(inputs.model, "gemini-2.5-flash-lite");
}

#[tokio::test]
async fn remote_commands_report_missing_token() {
    let config = offline_config();
    let err = graph::run_insights(&config, Some("1784"), 5, Path::new("unused.json"))
        .await
        .expect_err("no token configured");
    assert!(
        err.to_string().contains("ACCESS_TOKEN"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn remote_commands_report_missing_account() {
    let mut config = offline_config();
    config.access_token = Some("token".to_string());
    let err = graph::run_download(&config, None, 5, Path::new("unused"))
        .await
        .expect_err("no account selected");
    assert!(err.to_string().contains("--account"), "unexpected error: {err}");
}

#[tokio::test]
async fn accounts_requires_app_credentials() {
    let mut config = offline_config();
    config.access_token = Some("token".to_string());
    let err = graph::run_accounts(&config)
        .await
        .expect_err("no app id configured");
    assert!(err.to_string().contains("APP_ID"), "unexpected error: {err}");
}

#[tokio::test]
async fn analyze_requires_inference_key() {
    let config = offline_config();
    let dir = tempfile::tempdir().expect("tempdir");
    let err = analyze::run_analyze(&config, dir.path(), None, None)
        .await
        .expect_err("no inference key configured");
    assert!(
        err.to_string().contains("GEMINI_API_KEY"),
        "unexpected error: {err}"
    );
}

#[test]
fn write_json_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("rows.json");
    graph::write_json(&path, &vec![1, 2, 3]).expect("write should succeed");

    let raw = std::fs::read_to_string(&path).expect("read back");
    let parsed: Vec<u32> = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(parsed, vec![1, 2, 3]);
}
