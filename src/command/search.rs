//! Search metadata for the note list.
//!
//! The filtered note ids and tag suggestions in the view state are a cache of the
//! last search. Whenever a dispatched event can change what the list shows, the
//! coordinator recomputes them here and attaches the result as event metadata.
//!
//! Queries are split on whitespace. A `tag:<name>` token keeps notes carrying that
//! tag; every other token must fuzzy-match the note content.

use crate::app::modes::ListMode;
use crate::app::SearchResults;
use crate::domain::{EntityId, Note, Tag};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

const TAG_PREFIX: &str = "tag:";

/// Upper bound on tag suggestions offered for one query.
const MAX_TAG_SUGGESTIONS: usize = 5;

struct Query {
    tags: Vec<String>,
    terms: Vec<String>,
}

impl Query {
    fn parse(raw: &str) -> Self {
        let mut tags = Vec::new();
        let mut terms = Vec::new();
        for token in raw.split_whitespace().map(str::to_lowercase) {
            match token.strip_prefix(TAG_PREFIX) {
                Some(tag) if !tag.is_empty() => tags.push(tag.to_string()),
                Some(_) => {}
                None => terms.push(token),
            }
        }
        Self { tags, terms }
    }
}

/// Ids of the notes the list shows for `mode` and `query`, in list order.
#[must_use]
pub fn visible_note_ids(notes: &[Note], tags: &[Tag], mode: &ListMode, query: &str) -> Vec<EntityId> {
    let query = Query::parse(query);
    let matcher = (!query.terms.is_empty()).then(SkimMatcherV2::default);

    let tag_name = mode
        .opened_tag_id()
        .and_then(|id| tags.iter().find(|tag| tag.id == id))
        .map(|tag| tag.name.to_lowercase());

    notes
        .iter()
        .filter(|note| note.is_deleted() == mode.is_trash())
        .filter(|note| match (mode.opened_tag_id(), &tag_name) {
            (None, _) => true,
            (Some(_), Some(name)) => note.has_tag(name),
            (Some(_), None) => false,
        })
        .filter(|note| query.tags.iter().all(|tag| note.has_tag(tag)))
        .filter(|note| {
            matcher.as_ref().map_or(true, |m| {
                let content = note.data.content.to_lowercase();
                query
                    .terms
                    .iter()
                    .all(|term| m.fuzzy_match(&content, term).is_some())
            })
        })
        .map(|note| note.id.clone())
        .collect()
}

/// Tags whose name matches the whole query, best match first.
#[must_use]
pub fn tag_suggestions(tags: &[Tag], query: &str) -> Vec<EntityId> {
    let needle = query.trim().to_lowercase();
    let needle = needle.strip_prefix(TAG_PREFIX).unwrap_or(&needle);
    if needle.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &Tag)> = tags
        .iter()
        .filter_map(|tag| {
            matcher
                .fuzzy_match(&tag.name.to_lowercase(), needle)
                .map(|score| (score, tag))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));

    scored
        .into_iter()
        .take(MAX_TAG_SUGGESTIONS)
        .map(|(_, tag)| tag.id.clone())
        .collect()
}

/// Computes fresh search metadata.
#[must_use]
pub fn search(notes: &[Note], tags: &[Tag], mode: &ListMode, query: &str) -> SearchResults {
    let _span = tracing::debug_span!(
        "search",
        total_notes = notes.len(),
        query_len = query.len(),
        mode = ?mode
    )
    .entered();

    let results = SearchResults {
        note_ids: visible_note_ids(notes, tags, mode, query),
        tag_ids: tag_suggestions(tags, query),
    };
    tracing::debug!(
        filtered_count = results.note_ids.len(),
        suggestions = results.tag_ids.len(),
        "search metadata computed"
    );
    results
}
