//! Owned media listings and carousel child resolution.

use postlens_core::{CarouselChild, Post, PostSource};

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::pagination::{next_cursor, page_size, MAX_PAGES};
use crate::types::{ChildNode, ChildrenContainer, MediaNode, Page};

/// Fields requested for owned media listings.
pub const DEFAULT_MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp";

/// Listing fields that also inline carousel children.
pub const MEDIA_FIELDS_WITH_CHILDREN: &str = "id,caption,media_type,media_url,thumbnail_url,\
permalink,timestamp,children{id,media_type,media_url,thumbnail_url}";

impl GraphClient {
    /// Up to `limit` most recent posts of `ig_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on HTTP failure, an API error envelope, or
    /// [`GraphError::PaginationLimit`] if the listing never terminates.
    pub async fn fetch_recent_media(
        &self,
        ig_id: &str,
        limit: usize,
        fields: &str,
    ) -> Result<Vec<Post>, GraphError> {
        let mut posts: Vec<Post> = Vec::new();
        let mut after: Option<String> = None;
        let path = format!("{ig_id}/media");

        for page_no in 1..=MAX_PAGES {
            if posts.len() >= limit {
                break;
            }
            let size = page_size(limit - posts.len()).to_string();
            let mut params = vec![("fields", fields), ("limit", size.as_str())];
            if let Some(cursor) = after.as_deref() {
                params.push(("after", cursor));
            }
            let url = self.build_url(&self.version, &path, &params)?;
            let page: Page<MediaNode> = self.get_json(&url, "media listing").await?;

            let received = page.data.len();
            posts.extend(
                page.data
                    .into_iter()
                    .map(|n| n.into_post(PostSource::Owned)),
            );
            tracing::debug!(page = page_no, received, total = posts.len(), "media page fetched");

            after = next_cursor(page.paging.as_ref());
            if after.is_none() || received == 0 {
                posts.truncate(limit);
                return Ok(posts);
            }
            if page_no == MAX_PAGES && posts.len() < limit {
                return Err(GraphError::PaginationLimit {
                    context: path,
                    max_pages: MAX_PAGES,
                });
            }
        }

        posts.truncate(limit);
        Ok(posts)
    }

    /// Children of carousel `media_id`, in API order, with URLs resolved.
    ///
    /// Tries the inline `children{...}` expansion first, then looks up each
    /// child that came back without a URL, and finally falls back to the
    /// `/children` edge. Never fails: lookup errors are logged and an empty
    /// or partial list is returned.
    pub async fn fetch_children(&self, media_id: &str) -> Vec<CarouselChild> {
        let mut children = match self.fetch_inline_children(media_id).await {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(media_id, error = %e, "inline children lookup failed");
                Vec::new()
            }
        };

        if children.is_empty() {
            children = match self.fetch_children_edge(media_id).await {
                Ok(children) => children,
                Err(e) => {
                    tracing::warn!(media_id, error = %e, "children edge lookup failed");
                    return Vec::new();
                }
            };
        }

        for child in children.iter_mut().filter(|c| c.media_url.is_none()) {
            match self.fetch_child(&child.id).await {
                Ok(resolved) => {
                    child.media_url = resolved.media_url;
                    if child.media_type == postlens_core::MediaType::Unknown {
                        child.media_type = resolved.media_type;
                    }
                }
                Err(e) => {
                    tracing::warn!(media_id, child_id = %child.id, error = %e, "child lookup failed");
                }
            }
        }
        children
    }

    async fn fetch_inline_children(&self, media_id: &str) -> Result<Vec<CarouselChild>, GraphError> {
        let url = self.build_url(
            &self.version,
            media_id,
            &[("fields", "children{id,media_type,media_url,thumbnail_url}")],
        )?;
        let container: ChildrenContainer = self.get_json(&url, "inline children").await?;
        Ok(container
            .children
            .map(|p| p.data.into_iter().map(ChildNode::into_child).collect())
            .unwrap_or_default())
    }

    async fn fetch_children_edge(&self, media_id: &str) -> Result<Vec<CarouselChild>, GraphError> {
        let url = self.build_url(
            &self.version,
            &format!("{media_id}/children"),
            &[("fields", "id,media_type")],
        )?;
        let page: Page<ChildNode> = self.get_json(&url, "children edge").await?;
        Ok(page.data.into_iter().map(ChildNode::into_child).collect())
    }

    pub(crate) async fn fetch_child(&self, child_id: &str) -> Result<CarouselChild, GraphError> {
        let url = self.build_url(
            &self.version,
            child_id,
            &[("fields", "media_type,media_url,thumbnail_url")],
        )?;
        let mut node: serde_json::Value = self.get_json(&url, "child lookup").await?;
        if let Some(obj) = node.as_object_mut() {
            obj.insert("id".to_owned(), serde_json::Value::String(child_id.to_owned()));
        }
        let child: ChildNode = serde_json::from_value(node).map_err(|e| GraphError::Deserialize {
            context: "child lookup".to_owned(),
            source: e,
        })?;
        Ok(child.into_child())
    }
}
