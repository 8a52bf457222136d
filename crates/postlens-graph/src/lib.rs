//! Client for the social-graph HTTP API: account lookup, media listings,
//! per-post and account insights, business discovery, and media downloads.

pub mod accounts;
pub mod client;
pub mod discovery;
pub mod download;
pub mod error;
pub mod insights;
pub mod media;
pub mod pagination;
pub mod types;

pub use client::{GraphClient, GraphClientOptions};
pub use discovery::{extract_username, DiscoveredProfile};
pub use download::{DownloadReport, MediaDownloader};
pub use error::GraphError;
pub use insights::{AccountInsightRow, AccountInsightsQuery};
