//! Joins model analysis entries back to post metadata.
//!
//! Each entry is attributed by the `media_id` the model echoes. If the echo
//! is missing or names no file in the manifest, the entry's position in the
//! output is used as an index into the manifest instead. Every merged entry
//! carries the full metric and metadata schema, zero/empty when the post is
//! unknown.

use std::collections::{HashMap, HashSet};

use postlens_core::Post;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::prompt::ANALYSIS_KEYS;

/// One analysis result with engagement and metadata attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntry {
    /// Model-produced fields other than the ones below.
    #[serde(flatten)]
    pub analysis: Map<String, Value>,
    pub media_id: String,
    pub like_count: u64,
    pub view_count: u64,
    pub comments_count: u64,
    pub shares: u64,
    pub saves: u64,
    pub reach: u64,
    pub profile_visits: u64,
    pub follows: u64,
    pub replies: u64,
    pub video_view_total_time: u64,
    pub avg_watch_time: u64,
    pub caption: String,
    pub media_type: String,
    pub media_url: String,
    pub thumbnail_url: String,
    pub permalink: String,
}

/// Keys owned by [`MergedEntry`] itself; removed from `analysis` so the
/// flattened output never repeats a key.
const RESERVED_KEYS: &[&str] = &[
    "media_id",
    "like_count",
    "view_count",
    "comments_count",
    "shares",
    "saves",
    "reach",
    "profile_visits",
    "follows",
    "replies",
    "video_view_total_time",
    "avg_watch_time",
    "caption",
    "media_type",
    "media_url",
    "thumbnail_url",
    "permalink",
];

/// Score fields downstream reports expect, defaulted when the model omits
/// them.
const RATE_KEYS: &[&str] = &["self_rate", "social_rate", "relatability_rate"];

fn echoed_id(entry: &Map<String, Value>) -> Option<String> {
    match entry.get("media_id")? {
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl MergedEntry {
    fn build(media_id: String, mut analysis: Map<String, Value>, post: Option<&Post>) -> Self {
        for key in RESERVED_KEYS {
            analysis.remove(*key);
        }
        for key in ANALYSIS_KEYS.iter().filter(|k| **k != "media_id") {
            analysis
                .entry((*key).to_owned())
                .or_insert_with(|| Value::String(String::new()));
        }
        for key in RATE_KEYS {
            analysis
                .entry((*key).to_owned())
                .or_insert_with(|| serde_json::json!(0.0));
        }

        let metrics = post.map(|p| p.metrics).unwrap_or_default();
        let text = |value: Option<&str>| value.unwrap_or_default().to_owned();

        Self {
            analysis,
            media_id,
            like_count: metrics.likes,
            view_count: metrics.views,
            comments_count: metrics.comments,
            shares: metrics.shares,
            saves: metrics.saves,
            reach: metrics.reach,
            profile_visits: metrics.profile_visits,
            follows: metrics.follows,
            replies: metrics.replies,
            video_view_total_time: metrics.video_view_total_time,
            avg_watch_time: metrics.avg_watch_time,
            caption: text(post.map(|p| p.caption.as_str())),
            media_type: post.map(|p| p.media_type.to_string()).unwrap_or_default(),
            media_url: text(post.and_then(|p| p.media_url.as_deref())),
            thumbnail_url: text(post.and_then(|p| p.thumbnail_url.as_deref())),
            permalink: text(post.and_then(|p| p.permalink.as_deref())),
        }
    }
}

/// Merges `entries` with `posts`.
///
/// `manifest` holds the media id of each attached file in attachment order.
/// Entries that are not JSON objects are dropped with a warning.
#[must_use]
pub fn merge_results(entries: Vec<Value>, manifest: &[String], posts: &[Post]) -> Vec<MergedEntry> {
    let known: HashSet<&str> = manifest.iter().map(String::as_str).collect();
    let by_id: HashMap<&str, &Post> = posts.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut merged = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let Value::Object(fields) = entry else {
            tracing::warn!(index = idx, "dropping non-object analysis entry");
            continue;
        };

        let echoed = echoed_id(&fields);
        let media_id = match echoed {
            Some(id) if known.contains(id.as_str()) => id,
            other => match manifest.get(idx) {
                Some(positional) => {
                    tracing::debug!(index = idx, echoed = ?other, media_id = %positional, "attributing entry by position");
                    positional.clone()
                }
                None => other.unwrap_or_default(),
            },
        };

        let post = by_id.get(media_id.as_str()).copied();
        if post.is_none() {
            tracing::debug!(media_id = %media_id, "no post metadata for entry; using defaults");
        }
        merged.push(MergedEntry::build(media_id, fields, post));
    }
    merged
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
