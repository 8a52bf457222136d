//! Carousel grouping of downloaded media files.
//!
//! Carousel children are saved as `<parent>_<child>.<ext>`; everything else
//! stands alone. Grouping is a pure function of the file names and the API's
//! child order, so running it again over the same directory (including any
//! PDFs it produced, which are ignored) gives the same groups in the same
//! order.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use postlens_core::ChildOrder;
use regex::Regex;

static CAROUSEL_CHILD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)_(\d+)\.([^.]+)$").expect("valid carousel child regex"));

static MEDIA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5,}").expect("valid media id regex"));

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classifies a file name by extension. Hidden files and anything that is
/// neither image nor video yield `None`.
#[must_use]
pub fn media_kind(file_name: &str) -> Option<MediaKind> {
    if file_name.starts_with('.') {
        return None;
    }
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Files that are analyzed as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaGroup {
    /// Parent id for carousels, file stem otherwise. Singletons whose stem is
    /// shared with another group are keyed by the full file name. Also the
    /// stem of the merged PDF.
    pub key: String,
    /// Post id the analysis is attributed to.
    pub media_id: String,
    /// File names in presentation order.
    pub files: Vec<String>,
    pub kind: MediaKind,
}

impl MediaGroup {
    /// Multi-image groups are merged into a single document.
    #[must_use]
    pub fn needs_merge(&self) -> bool {
        self.kind == MediaKind::Image && self.files.len() > 1
    }
}

/// First run of five or more digits in `stem`, else the stem itself.
fn singleton_media_id(stem: &str) -> String {
    MEDIA_ID
        .find(stem)
        .map_or_else(|| stem.to_owned(), |m| m.as_str().to_owned())
}

#[derive(Debug)]
struct Member {
    name: String,
    child_id: Option<String>,
}

/// Groups `file_names` into carousels and singletons.
///
/// Images named `<parent>_<child>.<ext>` share a group keyed by `parent` and
/// are ordered by the child's position in `order`, then by the numeric child
/// index, with unknown positions last. Videos are never grouped.
#[must_use]
pub fn group_media<S: AsRef<str>>(file_names: &[S], order: &ChildOrder) -> Vec<MediaGroup> {
    let mut carousels: BTreeMap<String, Vec<Member>> = BTreeMap::new();
    // Keyed by full file name: `1.jpg` and `1.mp4` are distinct singletons.
    let mut singles: BTreeMap<String, (String, MediaKind)> = BTreeMap::new();
    let mut stem_counts: BTreeMap<String, usize> = BTreeMap::new();

    for name in file_names.iter().map(AsRef::as_ref) {
        let Some(kind) = media_kind(name) else {
            continue;
        };
        let stem = name.rsplit_once('.').map_or(name, |(s, _)| s);

        if kind == MediaKind::Image {
            if let Some(caps) = CAROUSEL_CHILD.captures(name) {
                carousels.entry(caps[1].to_owned()).or_default().push(Member {
                    name: name.to_owned(),
                    child_id: Some(caps[2].to_owned()),
                });
                continue;
            }
        }
        *stem_counts.entry(stem.to_owned()).or_default() += 1;
        singles.insert(name.to_owned(), (stem.to_owned(), kind));
    }

    let mut groups: BTreeMap<String, MediaGroup> = BTreeMap::new();

    for (parent, mut members) in carousels {
        members.sort_by(|a, b| sort_key(&parent, a, order).cmp(&sort_key(&parent, b, order)));
        groups.insert(
            parent.clone(),
            MediaGroup {
                media_id: parent.clone(),
                key: parent,
                files: members.into_iter().map(|m| m.name).collect(),
                kind: MediaKind::Image,
            },
        );
    }

    for (name, (stem, kind)) in singles {
        let carousel = groups.contains_key(&stem);
        if carousel && kind == MediaKind::Image {
            // `<id>.jpg` next to `<id>_<n>.jpg` files: keep it with the carousel, last.
            if let Some(group) = groups.get_mut(&stem) {
                group.files.push(name);
            }
            continue;
        }
        let shared = carousel || stem_counts.get(&stem).is_some_and(|n| *n > 1);
        let key = if shared { name.clone() } else { stem.clone() };
        groups.insert(
            key.clone(),
            MediaGroup {
                key,
                media_id: singleton_media_id(&stem),
                files: vec![name],
                kind,
            },
        );
    }

    groups.into_values().collect()
}

type SortKey<'a> = (bool, usize, bool, u64, &'a str);

fn sort_key<'a>(parent: &str, member: &'a Member, order: &ChildOrder) -> SortKey<'a> {
    let position = member
        .child_id
        .as_deref()
        .and_then(|child| order.position(parent, child));
    let index = member.child_id.as_deref().and_then(|c| c.parse::<u64>().ok());
    (
        position.is_none(),
        position.unwrap_or(usize::MAX),
        index.is_none(),
        index.unwrap_or(u64::MAX),
        member.name.as_str(),
    )
}

#[cfg(test)]
#[path = "grouping_test.rs"]
mod tests;
