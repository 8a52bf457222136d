//! Normalized post and account model shared by every data source.
//!
//! Owned-content insights and business discovery return engagement under
//! different field names (`likes` vs `like_count`, `saved` vs nothing at all).
//! Both paths are mapped into [`EngagementMetrics`] at the API boundary so
//! the rest of the pipeline reads a single schema.

use serde::{Deserialize, Serialize};

/// Media kind as reported by the social-graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    Reel,
    CarouselAlbum,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaType {
    /// Lenient parse of a wire value; unknown or empty strings map to
    /// [`MediaType::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "IMAGE" => Self::Image,
            "VIDEO" => Self::Video,
            "REEL" | "REELS" => Self::Reel,
            "CAROUSEL_ALBUM" => Self::CarouselAlbum,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn is_video(self) -> bool {
        matches!(self, Self::Video | Self::Reel)
    }

    /// Extension used when the media is written to disk.
    #[must_use]
    pub fn file_extension(self) -> &'static str {
        if self.is_video() {
            "mp4"
        } else {
            "jpg"
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Reel => "REEL",
            Self::CarouselAlbum => "CAROUSEL_ALBUM",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engagement counters for one post. Every field defaults to `0` when the
/// source does not report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub comments: u64,
    pub views: u64,
    pub shares: u64,
    pub saves: u64,
    pub reach: u64,
    pub profile_visits: u64,
    pub profile_activity: u64,
    pub follows: u64,
    pub replies: u64,
    pub navigation: u64,
    /// Total watch time across all plays, in milliseconds.
    pub video_view_total_time: u64,
    /// Average watch time per play, in milliseconds.
    pub avg_watch_time: u64,
}

impl EngagementMetrics {
    /// Assigns an insight metric by its API name. Returns `false` for names
    /// that have no slot in the normalized schema.
    pub fn set_by_insight_name(&mut self, name: &str, value: u64) -> bool {
        let slot = match name {
            "likes" | "like_count" => &mut self.likes,
            "comments" | "comments_count" => &mut self.comments,
            "views" | "view_count" | "plays" => &mut self.views,
            "shares" => &mut self.shares,
            "saved" | "saves" => &mut self.saves,
            "reach" => &mut self.reach,
            "profile_visits" => &mut self.profile_visits,
            "profile_activity" => &mut self.profile_activity,
            "follows" => &mut self.follows,
            "replies" => &mut self.replies,
            "navigation" => &mut self.navigation,
            "ig_reels_video_view_total_time" => &mut self.video_view_total_time,
            "ig_reels_avg_watch_time" => &mut self.avg_watch_time,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Where a [`Post`] was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSource {
    /// The authenticated account's own media, with full insights.
    #[default]
    Owned,
    /// Another account's public media via business discovery.
    Discovery,
}

/// One child item of a carousel post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselChild {
    pub id: String,
    #[serde(default)]
    pub media_type: MediaType,
    /// Absent until resolved with a follow-up lookup.
    #[serde(default)]
    pub media_url: Option<String>,
}

/// A single post with its metadata and engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub caption: String,
    /// ISO-8601 timestamp exactly as the API returns it, e.g.
    /// `"2025-04-07T16:47:59+0000"`.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub metrics: EngagementMetrics,
    /// Inline carousel children, in API order. Empty for non-carousels and
    /// for carousels whose children were not expanded in the listing.
    #[serde(default)]
    pub children: Vec<CarouselChild>,
    #[serde(default)]
    pub source: PostSource,
}

impl Post {
    /// URL to download for single-media posts: `media_url`, falling back to
    /// the video thumbnail.
    #[must_use]
    pub fn display_url(&self) -> Option<&str> {
        self.media_url
            .as_deref()
            .or(self.thumbnail_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    #[must_use]
    pub fn is_carousel(&self) -> bool {
        self.media_type == MediaType::CarouselAlbum
    }
}

/// A business account the token can read insights for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
}
