//! Carousel child ordering, recovered from the API and reused when files
//! are grouped back together on disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::posts::Post;

/// Parent media id → child ids in the order the API lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOrder(BTreeMap<String, Vec<String>>);

impl ChildOrder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the inline children of every carousel in `posts`.
    #[must_use]
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut order = Self::new();
        for post in posts.iter().filter(|p| !p.children.is_empty()) {
            order.insert(&post.id, post.children.iter().map(|c| c.id.clone()).collect());
        }
        order
    }

    pub fn insert(&mut self, parent_id: &str, child_ids: Vec<String>) {
        self.0.insert(parent_id.to_owned(), child_ids);
    }

    /// Zero-based position of `child_id` within `parent_id`'s carousel.
    #[must_use]
    pub fn position(&self, parent_id: &str, child_id: &str) -> Option<usize> {
        self.0
            .get(parent_id)?
            .iter()
            .position(|c| c == child_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
