use std::collections::HashMap;

use crate::models::{PageResult, SearchItem};

/// Accumulated results for one search key: every fetched page appended in
/// order, plus the number of the last page that was merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResults {
    pub items: Vec<SearchItem>,
    pub page: u32,
}

/// Read path for the active search key. Absent keys read as an empty list on
/// page 0, so the next "more" request asks for page 1 of nothing fetched yet.
#[derive(Debug, Clone, Copy)]
pub struct ResultView<'a> {
    pub items: &'a [SearchItem],
    pub page: u32,
}

/// Per-query result cache, keyed by the exact submitted search term.
///
/// Transitions are pure: `merge` and `dismiss` leave `self` untouched and
/// return the successor store, which keeps them safe to apply from the
/// single-threaded UI update cycle without aliasing surprises. Keys are never
/// evicted once populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    results: HashMap<String, CachedResults>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fetched page after everything already cached for its key and
    /// records the new page number. Other keys are carried over unchanged.
    /// Hits are not deduplicated across pages; if the API repeats an item the
    /// repeat is kept.
    pub fn merge(&self, result: PageResult) -> ResultStore {
        let mut next = self.clone();
        let entry = next
            .results
            .entry(result.key)
            .or_insert_with(|| CachedResults {
                items: Vec::new(),
                page: 0,
            });
        entry.items.extend(result.items);
        entry.page = result.page;
        next
    }

    /// Removes the first item with the given id from the key's list, keeping
    /// the stored page number. An absent key or id is a no-op, not an error.
    pub fn dismiss(&self, key: &str, item_id: &str) -> ResultStore {
        let mut next = self.clone();
        if let Some(entry) = next.results.get_mut(key) {
            if let Some(pos) = entry.items.iter().position(|item| item.id == item_id) {
                entry.items.remove(pos);
            }
        }
        next
    }

    pub fn active_view(&self, key: &str) -> ResultView<'_> {
        match self.results.get(key) {
            Some(entry) => ResultView {
                items: &entry.items,
                page: entry.page,
            },
            None => ResultView { items: &[], page: 0 },
        }
    }

    /// True until the first page for `key` has been merged. Used to skip the
    /// network entirely when a previously-searched term is resubmitted.
    pub fn needs_fetch(&self, key: &str) -> bool {
        !self.results.contains_key(key)
    }
}
