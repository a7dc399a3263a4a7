//! Note and tag models.
//!
//! Notes live in the note bucket; the coordinator only ever holds an id for the open
//! note plus a transient cached copy, and an ordered list of loaded notes used for
//! trash indexing, nudging and search.

use crate::domain::settings::SortType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Opaque record identifier assigned by a bucket.
pub type EntityId = String;

/// System tag marking a note as pinned to the top of the list.
pub const PINNED_TAG: &str = "pinned";

/// Payload of a note as stored in the note bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteData {
    pub content: String,
    pub tags: Vec<String>,
    pub system_tags: Vec<String>,
    /// Unix timestamp (seconds).
    pub creation_date: i64,
    /// Unix timestamp (seconds).
    pub modification_date: i64,
    pub deleted: bool,
}

impl NoteData {
    /// Creates an empty note payload stamped with the current time.
    #[must_use]
    pub fn new_now() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            creation_date: now,
            modification_date: now,
            ..Self::default()
        }
    }
}

/// A note record together with its bucket id.
///
/// `has_remote_update` is never stored; it is set on the cached open-note copy when
/// a remote patch arrived for it so the rendering layer can surface the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: EntityId,
    pub data: NoteData,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_remote_update: bool,
}

impl Note {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, data: NoteData) -> Self {
        Self {
            id: id.into(),
            data,
            has_remote_update: false,
        }
    }

    /// First non-blank line of the content, trimmed.
    #[must_use]
    pub fn title(&self) -> &str {
        self.data
            .content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.data.system_tags.iter().any(|t| t == PINNED_TAG)
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.data.deleted
    }

    /// Case-insensitive tag membership.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.data.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// A tag record together with its bucket id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub name: String,
    /// Manual ordering position; tags without one sort after indexed tags.
    #[serde(default)]
    pub index: Option<u32>,
}

/// Orders notes for display: pinned notes first, then by `sort_type`.
///
/// `reversed` flips the order within the pinned and unpinned groups, matching the
/// list's "reverse sort" setting. Ties fall back to id for a stable order.
pub fn sort_notes(notes: &mut [Note], sort_type: SortType, reversed: bool) {
    notes.sort_by(|a, b| {
        let pinned = b.is_pinned().cmp(&a.is_pinned());
        if pinned != Ordering::Equal {
            return pinned;
        }

        let by_key = match sort_type {
            SortType::ModificationDate => b.data.modification_date.cmp(&a.data.modification_date),
            SortType::CreationDate => b.data.creation_date.cmp(&a.data.creation_date),
            SortType::Alphabetical => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
        };
        let by_key = if reversed { by_key.reverse() } else { by_key };

        by_key.then_with(|| a.id.cmp(&b.id))
    });
}

/// Orders tags either alphabetically or by their manual index.
pub fn sort_tags(tags: &mut [Tag], alphabetical: bool) {
    if alphabetical {
        tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    } else {
        tags.sort_by(|a, b| match (a.index, b.index) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
    }
}
