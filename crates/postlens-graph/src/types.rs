//! Wire types for social-graph API responses.
//!
//! These mirror the JSON the API returns and are converted into the
//! normalized [`postlens_core::Post`] model before leaving this crate.

use postlens_core::{CarouselChild, EngagementMetrics, MediaType, Post, PostSource};
use serde::Deserialize;

/// Generic `{ "data": [...], "paging": {...} }` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub cursors: Option<Cursors>,
    /// Absolute URL of the next page; absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

/// One media object as returned by `/{ig_id}/media` or business discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaNode {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comments_count: Option<u64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub children: Option<Page<ChildNode>>,
}

impl MediaNode {
    /// Converts into the normalized [`Post`]. Counts present on the node
    /// (business discovery) seed the metrics; owned posts get theirs from
    /// the insights endpoint afterwards.
    #[must_use]
    pub fn into_post(self, source: PostSource) -> Post {
        let metrics = EngagementMetrics {
            likes: self.like_count.unwrap_or_default(),
            comments: self.comments_count.unwrap_or_default(),
            views: self.view_count.unwrap_or_default(),
            ..EngagementMetrics::default()
        };
        let children = self
            .children
            .map(|page| page.data.into_iter().map(ChildNode::into_child).collect())
            .unwrap_or_default();
        Post {
            id: self.id,
            caption: self.caption.unwrap_or_default(),
            timestamp: self.timestamp,
            media_type: self
                .media_type
                .as_deref()
                .map(MediaType::parse)
                .unwrap_or_default(),
            media_url: self.media_url,
            thumbnail_url: self.thumbnail_url,
            permalink: self.permalink,
            metrics,
            children,
            source,
        }
    }
}

/// A carousel child as it appears inline or from the `/children` edge.
#[derive(Debug, Clone, Deserialize)]
pub struct ChildNode {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl ChildNode {
    #[must_use]
    pub fn into_child(self) -> CarouselChild {
        let media_type = self
            .media_type
            .as_deref()
            .map(MediaType::parse)
            .unwrap_or_default();
        let media_url = self
            .media_url
            .or(self.thumbnail_url)
            .filter(|u| !u.is_empty());
        CarouselChild {
            id: self.id,
            media_type,
            media_url,
        }
    }
}

/// `/{id}?fields=children{...}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChildrenContainer {
    #[serde(default)]
    pub children: Option<Page<ChildNode>>,
}

/// One metric from an `/insights` response.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightMetric {
    pub name: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub values: Vec<InsightValue>,
    #[serde(default)]
    pub total_value: Option<TotalValue>,
}

impl InsightMetric {
    /// The metric's current value: the last entry of `values`, else
    /// `total_value.value`.
    #[must_use]
    pub fn latest_value(&self) -> Option<&serde_json::Value> {
        self.values
            .last()
            .map(|v| &v.value)
            .or_else(|| self.total_value.as_ref().map(|t| &t.value))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightValue {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotalValue {
    #[serde(default)]
    pub value: serde_json::Value,
}

/// `debug_token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugTokenResponse {
    pub data: DebugTokenData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugTokenData {
    #[serde(default)]
    pub granular_scopes: Vec<GranularScope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GranularScope {
    pub scope: String,
    #[serde(default)]
    pub target_ids: Vec<String>,
}

/// `/{id}?fields=id,username` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameNode {
    #[serde(default)]
    pub username: Option<String>,
}

/// Top level of a business-discovery request.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub business_discovery: Option<DiscoveryNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub media_count: Option<u64>,
    #[serde(default)]
    pub media: Option<Page<MediaNode>>,
}
