//! The set of confirmed-misspelled word ranges.
//!
//! Entries are tracked intervals with the dictionary that flagged them, kept
//! sorted by range start. The engine guarantees the entries never overlap: a
//! region is always cleared from this set before it is (re)submitted for
//! checking, so stale and fresh results cannot coexist. The misspelled word
//! itself is re-derived from the document on demand, never cached.

use crate::collaborators::Document;
use crate::interval::{IntervalArena, IntervalHandle};
use crate::position::{DocRange, Position};

#[derive(Debug)]
struct MisspelledEntry {
    interval: IntervalHandle,
    dictionary: String,
}

/// Sorted collection of misspelled word ranges, queried by position for
/// rendering and context menus.
#[derive(Debug, Default)]
pub struct MisspelledSet {
    entries: Vec<MisspelledEntry>,
}

impl MisspelledSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry (its interval must resolve in `arena`).
    pub fn insert(&mut self, arena: &IntervalArena, interval: IntervalHandle, dictionary: String) {
        let Some(range) = arena.get(interval) else {
            return;
        };
        let pos = self
            .entries
            .partition_point(|e| match arena.get(e.interval) {
                Some(r) => r.start < range.start,
                None => true,
            });
        self.entries.insert(
            pos,
            MisspelledEntry {
                interval,
                dictionary,
            },
        );
    }

    /// The entry covering `pos`, if any.
    pub fn entry_at(&self, arena: &IntervalArena, pos: Position) -> Option<(DocRange, &str)> {
        self.entries.iter().find_map(|e| {
            let range = arena.get(e.interval)?;
            range.contains(pos).then_some((range, e.dictionary.as_str()))
        })
    }

    /// The dictionary of the entry whose range equals `range` exactly.
    pub fn entry_for_exact_range(&self, arena: &IntervalArena, range: DocRange) -> Option<&str> {
        self.entries.iter().find_map(|e| {
            (arena.get(e.interval)? == range).then_some(e.dictionary.as_str())
        })
    }

    /// Remove every entry overlapping `range`, returning the removed ranges.
    pub fn remove_overlapping(
        &mut self,
        arena: &mut IntervalArena,
        range: DocRange,
    ) -> Vec<DocRange> {
        let mut removed = Vec::new();
        self.entries.retain(|e| match arena.get(e.interval) {
            Some(r) if r.overlaps(&range) => {
                removed.push(r);
                arena.release(e.interval);
                false
            }
            Some(_) => true,
            None => false,
        });
        removed
    }

    /// Remove every entry whose document text equals `word` (used when the
    /// user accepts a word globally), returning the removed ranges.
    pub fn remove_entries_for_word(
        &mut self,
        arena: &mut IntervalArena,
        document: &dyn Document,
        word: &str,
    ) -> Vec<DocRange> {
        let mut removed = Vec::new();
        self.entries.retain(|e| match arena.get(e.interval) {
            Some(r) => {
                if document.decode(r).text == word {
                    removed.push(r);
                    arena.release(e.interval);
                    false
                } else {
                    true
                }
            }
            None => false,
        });
        removed
    }

    /// Remove the entry owning `handle` (lifecycle event routing), returning
    /// its last range.
    pub fn remove_interval(
        &mut self,
        arena: &mut IntervalArena,
        handle: IntervalHandle,
    ) -> Option<DocRange> {
        let idx = self.entries.iter().position(|e| e.interval == handle)?;
        self.entries.remove(idx);
        let range = arena.get(handle);
        arena.release(handle);
        range
    }

    /// Remove everything, returning the removed ranges.
    pub fn clear(&mut self, arena: &mut IntervalArena) -> Vec<DocRange> {
        let mut removed = Vec::new();
        for e in self.entries.drain(..) {
            if let Some(r) = arena.get(e.interval) {
                removed.push(r);
            }
            arena.release(e.interval);
        }
        removed
    }

    /// Current `(range, dictionary)` pairs, ordered by start.
    pub fn all(&self, arena: &IntervalArena) -> Vec<(DocRange, String)> {
        self.entries
            .iter()
            .filter_map(|e| Some((arena.get(e.interval)?, e.dictionary.clone())))
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
