//! Business discovery: public media and counts for another account.

use postlens_core::{Post, PostSource};
use reqwest::Url;
use serde::Serialize;

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::pagination::{next_cursor, page_size, MAX_PAGES};
use crate::types::DiscoveryResponse;

const MEDIA_NODE_FIELDS: &str = "id,caption,media_type,media_url,thumbnail_url,permalink,\
timestamp,like_count,comments_count,view_count,children{id,media_type,media_url,thumbnail_url,permalink}";

/// Another account's profile and recent posts.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredProfile {
    pub id: Option<String>,
    pub username: String,
    pub followers_count: Option<u64>,
    pub media_count: Option<u64>,
    pub posts: Vec<Post>,
}

/// Extracts a handle from a profile URL or a bare `@handle`.
///
/// `https://www.instagram.com/some.brand/?hl=en` → `some.brand`. Inputs with a
/// scheme or an `instagram.com` host are parsed as URLs and the first path
/// segment is the handle; anything else is taken as the handle itself.
///
/// # Errors
///
/// Returns [`GraphError::InvalidUsername`] when the URL has no path segment,
/// the result is empty, or it contains characters a handle cannot have.
pub fn extract_username(input: &str) -> Result<String, GraphError> {
    let trimmed = input.trim();
    let invalid = || GraphError::InvalidUsername(input.to_owned());

    let candidate = if trimmed.contains("://") || trimmed.contains("instagram.com") {
        let url = if trimmed.contains("://") {
            Url::parse(trimmed)
        } else {
            Url::parse(&format!("https://{trimmed}"))
        }
        .map_err(|_| invalid())?;
        url.path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .map(str::to_owned)
            .ok_or_else(invalid)?
    } else {
        trimmed.trim_end_matches('/').to_owned()
    };

    let candidate = candidate.trim_start_matches('@');
    if is_valid_username(candidate) {
        Ok(candidate.to_owned())
    } else {
        Err(invalid())
    }
}

/// Handles are 1–30 characters of ASCII letters, digits, `.` and `_`.
fn is_valid_username(name: &str) -> bool {
    (1..=30).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// Field expression for one discovery request.
fn discovery_fields(username: &str, limit: usize, after: Option<&str>) -> String {
    let media = match after {
        Some(cursor) => format!("media.after({cursor}).limit({limit})"),
        None => format!("media.limit({limit})"),
    };
    format!(
        "business_discovery.username({username}){{id,username,followers_count,media_count,{media}{{{MEDIA_NODE_FIELDS}}}}}"
    )
}

impl GraphClient {
    /// Up to `limit` recent posts of the public business account `username`,
    /// seen through the caller's own account `ig_id`.
    ///
    /// Counts come from the discovery payload (`like_count`, `comments_count`,
    /// `view_count`) and land in the same normalized metrics as owned posts.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidUsername`] for malformed handles,
    /// [`GraphError::DiscoveryUnavailable`] when the response carries no
    /// `business_discovery` object, or any HTTP/API error.
    pub async fn business_discovery(
        &self,
        ig_id: &str,
        username: &str,
        limit: usize,
    ) -> Result<DiscoveredProfile, GraphError> {
        if !is_valid_username(username) {
            return Err(GraphError::InvalidUsername(username.to_owned()));
        }

        let mut profile = DiscoveredProfile {
            id: None,
            username: username.to_owned(),
            followers_count: None,
            media_count: None,
            posts: Vec::new(),
        };
        let mut after: Option<String> = None;

        for page_no in 1..=MAX_PAGES {
            let size = page_size(limit.saturating_sub(profile.posts.len()));
            let fields = discovery_fields(username, size, after.as_deref());
            let url = self.build_url(&self.discovery_version, ig_id, &[("fields", fields.as_str())])?;
            let response: DiscoveryResponse = self.get_json(&url, "business discovery").await?;

            let Some(node) = response.business_discovery else {
                return Err(GraphError::DiscoveryUnavailable {
                    username: username.to_owned(),
                });
            };

            if page_no == 1 {
                profile.id = node.id;
                if let Some(name) = node.username {
                    profile.username = name;
                }
                profile.followers_count = node.followers_count;
                profile.media_count = node.media_count;
            }

            let Some(media) = node.media else { break };
            let received = media.data.len();
            profile.posts.extend(
                media
                    .data
                    .into_iter()
                    .map(|n| n.into_post(PostSource::Discovery)),
            );
            after = next_cursor(media.paging.as_ref());
            tracing::debug!(page = page_no, received, total = profile.posts.len(), "discovery page fetched");

            if profile.posts.len() >= limit || after.is_none() || received == 0 {
                break;
            }
        }

        profile.posts.truncate(limit);
        tracing::info!(
            username = %profile.username,
            posts = profile.posts.len(),
            "business discovery complete"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_profile_url() {
        assert_eq!(
            extract_username("https://www.instagram.com/some.brand/").unwrap(),
            "some.brand"
        );
    }

    #[test]
    fn extracts_from_url_with_query() {
        assert_eq!(
            extract_username("https://instagram.com/brand_x?hl=en").unwrap(),
            "brand_x"
        );
    }

    #[test]
    fn accepts_bare_handle_with_at() {
        assert_eq!(extract_username("@brand").unwrap(), "brand");
        assert_eq!(extract_username("brand").unwrap(), "brand");
    }

    #[test]
    fn accepts_profile_url_without_scheme() {
        assert_eq!(
            extract_username("instagram.com/some.brand/reels/").unwrap(),
            "some.brand"
        );
        assert_eq!(extract_username("brand/").unwrap(), "brand");
    }

    #[test]
    fn bare_host_is_not_a_handle() {
        for input in ["https://www.instagram.com/", "https://instagram.com", "www.instagram.com"] {
            assert!(
                matches!(extract_username(input), Err(GraphError::InvalidUsername(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_invalid_handles() {
        assert!(matches!(extract_username(""), Err(GraphError::InvalidUsername(_))));
        assert!(matches!(
            extract_username("bad handle!"),
            Err(GraphError::InvalidUsername(_))
        ));
    }

    #[test]
    fn first_page_fields_have_no_cursor() {
        let f = discovery_fields("brand", 10, None);
        assert!(f.starts_with("business_discovery.username(brand){id,username,followers_count,media_count,media.limit(10){id,caption"));
        assert!(f.ends_with("permalink}}}"));
    }

    #[test]
    fn later_pages_carry_cursor() {
        let f = discovery_fields("brand", 25, Some("QVFI"));
        assert!(f.contains("media.after(QVFI).limit(25){"));
    }
}
