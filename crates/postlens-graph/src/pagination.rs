//! Cursor pagination over `paging.cursors.after`.
//!
//! The API returns `paging.next` only when another page exists, so a page
//! with an `after` cursor but no `next` URL is the last one.

use crate::types::Paging;

/// Upper bound on pages fetched for one listing.
pub const MAX_PAGES: usize = 200;

/// Largest page size the media endpoints accept.
pub const MAX_PAGE_SIZE: usize = 50;

/// Cursor for the following page, or `None` on the last page.
#[must_use]
pub fn next_cursor(paging: Option<&Paging>) -> Option<String> {
    let paging = paging?;
    paging.next.as_ref()?;
    paging
        .cursors
        .as_ref()?
        .after
        .clone()
        .filter(|c| !c.is_empty())
}

/// Page size for the next request given how many items are still wanted.
#[must_use]
pub fn page_size(remaining: usize) -> usize {
    remaining.clamp(1, MAX_PAGE_SIZE)
}
