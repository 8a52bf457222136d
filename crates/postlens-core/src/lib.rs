//! Shared domain model, configuration, and retry policy for postlens.

pub mod app_config;
pub mod carousel;
pub mod config;
pub mod outliers;
pub mod posts;
pub mod retry;
pub mod session;

use thiserror::Error;

pub use app_config::AppConfig;
pub use carousel::ChildOrder;
pub use config::{load_app_config, load_app_config_from_env};
pub use outliers::{mean_engagement, select_outliers, select_outliers_by, EngagementField, OutlierSet};
pub use posts::{Account, CarouselChild, EngagementMetrics, MediaType, Post, PostSource};
pub use retry::{retry, Backoff, RetryPolicy};
pub use session::Session;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// User-facing errors for operations that need state the operator has not
/// provided yet.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no access token configured; set ACCESS_TOKEN in your environment or .env")]
    MissingToken,

    #[error("no account selected; run `postlens accounts` and pass --account or set IG_ACCOUNT_ID")]
    MissingAccount,

    #[error("{0} is required for this command; set it in your environment or .env")]
    MissingCredential(&'static str),
}
