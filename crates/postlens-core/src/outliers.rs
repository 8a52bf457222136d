//! Outlier selection over a sampled set of posts.

use serde::Serialize;

use crate::posts::Post;

/// Engagement counter used to rank posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngagementField {
    #[default]
    Likes,
    Comments,
    Views,
    Shares,
    Saves,
    Reach,
}

impl EngagementField {
    #[must_use]
    pub fn value_of(self, post: &Post) -> u64 {
        let m = &post.metrics;
        match self {
            Self::Likes => m.likes,
            Self::Comments => m.comments,
            Self::Views => m.views,
            Self::Shares => m.shares,
            Self::Saves => m.saves,
            Self::Reach => m.reach,
        }
    }
}

/// Posts whose engagement is strictly above `multiplier × mean`.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierSet {
    /// Mean engagement over the whole sample. `0.0` for an empty sample.
    pub mean: f64,
    /// `multiplier × mean`; a post must exceed this to be selected.
    pub threshold: f64,
    pub posts: Vec<Post>,
}

/// Arithmetic mean of `field` over `posts`; `0.0` when `posts` is empty.
#[must_use]
pub fn mean_engagement(posts: &[Post], field: EngagementField) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let sum: f64 = posts.iter().map(|p| field.value_of(p) as f64).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = posts.len() as f64;
    sum / count
}

/// Select posts whose likes are strictly greater than `multiplier` times the
/// sample mean. A post sitting exactly on the threshold is not an outlier.
#[must_use]
pub fn select_outliers(posts: &[Post], multiplier: f64) -> OutlierSet {
    select_outliers_by(posts, multiplier, EngagementField::Likes)
}

/// [`select_outliers`] over an arbitrary engagement field.
#[must_use]
pub fn select_outliers_by(posts: &[Post], multiplier: f64, field: EngagementField) -> OutlierSet {
    let mean = mean_engagement(posts, field);
    let threshold = multiplier * mean;
    #[allow(clippy::cast_precision_loss)]
    let selected = posts
        .iter()
        .filter(|p| field.value_of(p) as f64 > threshold)
        .cloned()
        .collect();
    OutlierSet {
        mean,
        threshold,
        posts: selected,
    }
}
