//! Per-post and account-level insights.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use postlens_core::{EngagementMetrics, MediaType, Post};
use serde::Serialize;

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::media::MEDIA_FIELDS_WITH_CHILDREN;
use crate::types::{InsightMetric, Page};

/// Metrics requested for video posts and reels.
pub const VIDEO_METRICS: &[&str] = &[
    "views",
    "reach",
    "saved",
    "likes",
    "comments",
    "shares",
    "ig_reels_video_view_total_time",
    "ig_reels_avg_watch_time",
];

/// Metrics requested for images and carousels.
pub const IMAGE_METRICS: &[&str] = &[
    "views",
    "reach",
    "replies",
    "saved",
    "likes",
    "comments",
    "shares",
    "follows",
    "profile_visits",
    "profile_activity",
    "navigation",
];

/// Default account-level metrics.
pub const DEFAULT_ACCOUNT_METRICS: &[&str] = &[
    "impressions",
    "reach",
    "profile_views",
    "website_clicks",
    "get_directions_clicks",
    "phone_call_clicks",
    "text_message_clicks",
    "accounts_engaged",
    "total_interactions",
    "follower_count",
];

/// Concurrent insights requests when enriching a media listing.
const INSIGHTS_CONCURRENCY: usize = 4;

/// Metric set for a media kind. Unknown kinds get the video set.
#[must_use]
pub fn metrics_for(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Image | MediaType::CarouselAlbum => IMAGE_METRICS,
        MediaType::Video | MediaType::Reel | MediaType::Unknown => VIDEO_METRICS,
    }
}

/// Parameters for an account-level insights request.
#[derive(Debug, Clone)]
pub struct AccountInsightsQuery {
    pub metrics: Vec<String>,
    pub period: String,
    /// Unix seconds.
    pub since: Option<i64>,
    /// Unix seconds.
    pub until: Option<i64>,
    pub date_preset: Option<String>,
}

impl Default for AccountInsightsQuery {
    fn default() -> Self {
        Self {
            metrics: DEFAULT_ACCOUNT_METRICS
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
            period: "day".to_owned(),
            since: None,
            until: None,
            date_preset: None,
        }
    }
}

impl AccountInsightsQuery {
    /// Query parameters for this request as of `now`.
    ///
    /// A `date_preset` suppresses explicit bounds. Without a preset or any
    /// bound, a `day` period covers the trailing 30 days.
    #[must_use]
    pub fn resolve_params(&self, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("metric", self.metrics.join(",")),
            ("period", self.period.clone()),
        ];
        if let Some(preset) = &self.date_preset {
            params.push(("date_preset", preset.clone()));
            return params;
        }

        let (since, until) = if self.since.is_none() && self.until.is_none() && self.period == "day"
        {
            let until = now.timestamp();
            (Some((now - Duration::days(30)).timestamp()), Some(until))
        } else {
            (self.since, self.until)
        };
        if let Some(since) = since {
            params.push(("since", since.to_string()));
        }
        if let Some(until) = until {
            params.push(("until", until.to_string()));
        }
        params
    }
}

/// One `(metric, end_time)` data point of account insights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInsightRow {
    pub ig_id: String,
    pub metric: String,
    pub period: Option<String>,
    pub end_time: Option<String>,
    /// Scalar values as-is; objects and arrays as JSON text.
    pub value: serde_json::Value,
}

fn flatten_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            serde_json::Value::String(value.to_string())
        }
        other => other.clone(),
    }
}

/// Builds normalized metrics from an insights response.
#[must_use]
pub fn metrics_from_insights(data: &[InsightMetric]) -> EngagementMetrics {
    let mut metrics = EngagementMetrics::default();
    for metric in data {
        let Some(value) = metric.latest_value().and_then(serde_json::Value::as_u64) else {
            continue;
        };
        if !metrics.set_by_insight_name(&metric.name, value) {
            tracing::debug!(metric = %metric.name, "ignoring unmapped insight metric");
        }
    }
    metrics
}

impl GraphClient {
    /// Engagement metrics for a single media object.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on HTTP failure or an API error envelope.
    pub async fn fetch_media_insights(
        &self,
        media_id: &str,
        media_type: MediaType,
    ) -> Result<EngagementMetrics, GraphError> {
        let metric = metrics_for(media_type).join(",");
        let url = self.build_url(
            &self.version,
            &format!("{media_id}/insights"),
            &[("metric", metric.as_str())],
        )?;
        let page: Page<InsightMetric> = self.get_json(&url, "media insights").await?;
        Ok(metrics_from_insights(&page.data))
    }

    /// Up to `limit` recent posts of `ig_id` with their insights attached.
    ///
    /// A failed insights call for one post is logged and leaves that post
    /// with zero metrics. Output order matches the media listing.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] only when the media listing itself fails.
    pub async fn fetch_post_insights(
        &self,
        ig_id: &str,
        limit: usize,
    ) -> Result<Vec<Post>, GraphError> {
        let posts = self
            .fetch_recent_media(ig_id, limit, MEDIA_FIELDS_WITH_CHILDREN)
            .await?;
        let total = posts.len();

        let enriched: Vec<Post> = stream::iter(posts.into_iter().enumerate())
            .map(|(idx, mut post)| async move {
                match self.fetch_media_insights(&post.id, post.media_type).await {
                    Ok(metrics) => post.metrics = metrics,
                    Err(e) => {
                        tracing::warn!(media_id = %post.id, error = %e, "insights unavailable; using zero metrics");
                    }
                }
                tracing::info!(
                    progress = %format!("{}/{total}", idx + 1),
                    media_id = %post.id,
                    media_type = %post.media_type,
                    "processed post insights"
                );
                post
            })
            .buffered(INSIGHTS_CONCURRENCY)
            .collect()
            .await;
        Ok(enriched)
    }

    /// Account-level insights for `ig_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on HTTP failure or an API error envelope.
    pub async fn fetch_account_insights(
        &self,
        ig_id: &str,
        query: &AccountInsightsQuery,
    ) -> Result<Vec<AccountInsightRow>, GraphError> {
        let params = query.resolve_params(Utc::now());
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let url = self.build_url(&self.version, &format!("{ig_id}/insights"), &borrowed)?;
        let page: Page<InsightMetric> = self.get_json(&url, "account insights").await?;

        let mut rows = Vec::new();
        for metric in page.data {
            for point in &metric.values {
                rows.push(AccountInsightRow {
                    ig_id: ig_id.to_owned(),
                    metric: metric.name.clone(),
                    period: metric.period.clone(),
                    end_time: point.end_time.clone(),
                    value: flatten_value(&point.value),
                });
            }
        }
        tracing::info!(ig_id, rows = rows.len(), "account insights fetched");
        Ok(rows)
    }
}
