//! Tracked document intervals.
//!
//! A tracked interval is a [`DocRange`] whose endpoints stay correct while the
//! document mutates around it. All tracked intervals live in one
//! [`IntervalArena`]; owners hold generation-checked [`IntervalHandle`]s, so a
//! released slot can be reused without any risk of a stale handle resolving to
//! the new occupant.
//!
//! Edits are applied to the arena as a whole
//! ([`apply_insert`](IntervalArena::apply_insert) /
//! [`apply_remove`](IntervalArena::apply_remove)). Each call returns the
//! lifecycle events produced by that edit ([`IntervalEvent`]); an interval
//! reports [`IntervalEventKind::BecameEmpty`] at most once in its life, after
//! which its owner is expected to release it.

use crate::position::{DocRange, Position};

/// How an interval reacts to an insertion exactly at one of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Text inserted at either edge is absorbed into the interval.
    ///
    /// Used for queued work ranges, where an edit touching the edge of a
    /// pending range belongs to the same unit of work.
    Expand,
    /// Text inserted at either edge stays outside the interval.
    ///
    /// Used for misspelled-word ranges: typing at the edge of a flagged word
    /// must not stretch the underline (the edit re-queues the word anyway).
    Stay,
}

/// Generation-checked handle to a tracked interval.
///
/// A handle is only usable with the arena that produced it. After the interval
/// is released the handle goes stale: every arena operation on it becomes a
/// no-op returning `None`/`false`, even if the slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalHandle {
    index: u32,
    generation: u32,
}

/// Lifecycle event kinds reported by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalEventKind {
    /// The interval shrank to zero width (its text was deleted).
    BecameEmpty,
    /// The interval was discarded wholesale (document reload / full reset).
    Invalidated,
}

/// A lifecycle event for one tracked interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalEvent {
    /// The interval the event is about. Still resolvable until released.
    pub handle: IntervalHandle,
    /// What happened to it.
    pub kind: IntervalEventKind,
}

#[derive(Debug)]
struct IntervalData {
    range: DocRange,
    policy: GrowthPolicy,
    empty_notified: bool,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<IntervalData>,
}

/// Arena owning every tracked interval in the engine.
#[derive(Debug, Default)]
pub struct IntervalArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl IntervalArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a tracked interval.
    pub fn alloc(&mut self, range: DocRange, policy: GrowthPolicy) -> IntervalHandle {
        let data = IntervalData {
            range,
            policy,
            // An interval born empty never reports BecameEmpty; the event
            // marks the transition caused by an edit.
            empty_notified: range.is_empty(),
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            IntervalHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            IntervalHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Release an interval. Idempotent: releasing a stale handle is a no-op.
    pub fn release(&mut self, handle: IntervalHandle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.data.is_some() => {
                slot.data = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    /// Resolve a handle to its current range.
    pub fn get(&self, handle: IntervalHandle) -> Option<DocRange> {
        self.data(handle).map(|d| d.range)
    }

    /// Whether the handle still refers to a live interval.
    pub fn is_live(&self, handle: IntervalHandle) -> bool {
        self.data(handle).is_some()
    }

    /// Number of live intervals.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    fn data(&self, handle: IntervalHandle) -> Option<&IntervalData> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    /// Adjust every live interval for text inserted over `inserted`
    /// (post-edit coordinates: `inserted.start` is where typing began,
    /// `inserted.end` is one past the new text).
    pub fn apply_insert(&mut self, inserted: DocRange) -> Vec<IntervalEvent> {
        if inserted.is_empty() {
            return Vec::new();
        }
        let mut events = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(data) = slot.data.as_mut() else {
                continue;
            };
            let (move_start_at_anchor, move_end_at_anchor) = match data.policy {
                GrowthPolicy::Expand => (false, true),
                GrowthPolicy::Stay => (true, false),
            };
            data.range = DocRange::new(
                transform_insert(data.range.start, inserted, move_start_at_anchor),
                transform_insert(data.range.end, inserted, move_end_at_anchor),
            );
            Self::note_if_emptied(index, slot.generation, data, &mut events);
        }
        events
    }

    /// Adjust every live interval for text removed over `removed`
    /// (pre-edit coordinates of the deleted text).
    pub fn apply_remove(&mut self, removed: DocRange) -> Vec<IntervalEvent> {
        if removed.is_empty() {
            return Vec::new();
        }
        let mut events = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(data) = slot.data.as_mut() else {
                continue;
            };
            data.range = DocRange::new(
                transform_remove(data.range.start, removed),
                transform_remove(data.range.end, removed),
            );
            Self::note_if_emptied(index, slot.generation, data, &mut events);
        }
        events
    }

    /// Invalidate every live interval (full reset, e.g. document reload).
    ///
    /// The intervals remain resolvable until released, so owners can still
    /// read their last range while tearing down.
    pub fn invalidate_all(&mut self) -> Vec<IntervalEvent> {
        let mut events = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.data.is_some() {
                events.push(IntervalEvent {
                    handle: IntervalHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    kind: IntervalEventKind::Invalidated,
                });
            }
        }
        events
    }

    fn note_if_emptied(
        index: usize,
        generation: u32,
        data: &mut IntervalData,
        events: &mut Vec<IntervalEvent>,
    ) {
        if data.range.is_empty() && !data.empty_notified {
            data.empty_notified = true;
            events.push(IntervalEvent {
                handle: IntervalHandle {
                    index: index as u32,
                    generation,
                },
                kind: IntervalEventKind::BecameEmpty,
            });
        }
    }
}

fn shift_for_insert(p: Position, inserted: DocRange) -> Position {
    let line_delta = inserted.end.line - inserted.start.line;
    if p.line == inserted.start.line {
        if line_delta == 0 {
            Position::new(p.line, p.column + (inserted.end.column - inserted.start.column))
        } else {
            Position::new(
                p.line + line_delta,
                inserted.end.column + (p.column - inserted.start.column),
            )
        }
    } else {
        Position::new(p.line + line_delta, p.column)
    }
}

fn transform_insert(p: Position, inserted: DocRange, move_at_anchor: bool) -> Position {
    if p > inserted.start || (p == inserted.start && move_at_anchor) {
        shift_for_insert(p, inserted)
    } else {
        p
    }
}

fn transform_remove(p: Position, removed: DocRange) -> Position {
    if p <= removed.start {
        p
    } else if p >= removed.end {
        let line_delta = removed.end.line - removed.start.line;
        if p.line == removed.end.line {
            Position::new(
                removed.start.line,
                removed.start.column + (p.column - removed.end.column),
            )
        } else {
            Position::new(p.line - line_delta, p.column)
        }
    } else {
        removed.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sl: usize, sc: usize, el: usize, ec: usize) -> DocRange {
        DocRange::from_coords(sl, sc, el, ec)
    }

    #[test]
    fn test_insert_before_shifts_interval() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 10, 0, 15), GrowthPolicy::Stay);

        let events = arena.apply_insert(range(0, 2, 0, 5));
        assert!(events.is_empty());
        assert_eq!(arena.get(h), Some(range(0, 13, 0, 18)));
    }

    #[test]
    fn test_insert_after_leaves_interval() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 2, 0, 6), GrowthPolicy::Expand);

        arena.apply_insert(range(0, 6, 0, 9));
        // Expand policy: insertion at the right edge is absorbed.
        assert_eq!(arena.get(h), Some(range(0, 2, 0, 9)));

        let h2 = arena.alloc(range(1, 0, 1, 4), GrowthPolicy::Stay);
        arena.apply_insert(range(2, 0, 2, 3));
        assert_eq!(arena.get(h2), Some(range(1, 0, 1, 4)));
    }

    #[test]
    fn test_insert_at_edges_respects_policy() {
        let mut arena = IntervalArena::new();
        let expand = arena.alloc(range(0, 5, 0, 8), GrowthPolicy::Expand);
        let stay = arena.alloc(range(0, 5, 0, 8), GrowthPolicy::Stay);

        // Insert one char at the left edge.
        arena.apply_insert(range(0, 5, 0, 6));
        assert_eq!(arena.get(expand), Some(range(0, 5, 0, 9)));
        assert_eq!(arena.get(stay), Some(range(0, 6, 0, 9)));
    }

    #[test]
    fn test_multiline_insert_splits_line() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 10, 0, 14), GrowthPolicy::Stay);

        // Newline inserted at (0,4): text after column 4 moves to line 1.
        arena.apply_insert(range(0, 4, 1, 0));
        assert_eq!(arena.get(h), Some(range(1, 6, 1, 10)));
    }

    #[test]
    fn test_remove_before_shifts_back() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 10, 0, 15), GrowthPolicy::Stay);

        arena.apply_remove(range(0, 2, 0, 5));
        assert_eq!(arena.get(h), Some(range(0, 7, 0, 12)));
    }

    #[test]
    fn test_remove_covering_interval_reports_empty_once() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 4, 0, 9), GrowthPolicy::Stay);

        let events = arena.apply_remove(range(0, 2, 0, 12));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].handle, h);
        assert_eq!(events[0].kind, IntervalEventKind::BecameEmpty);
        assert_eq!(arena.get(h), Some(range(0, 2, 0, 2)));

        // A second removal around the same spot must not re-report.
        let events = arena.apply_remove(range(0, 1, 0, 2));
        assert!(events.is_empty());
    }

    #[test]
    fn test_remove_partial_overlap_truncates() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 4, 0, 10), GrowthPolicy::Stay);

        // Delete [7,13): interval keeps its head.
        arena.apply_remove(range(0, 7, 0, 13));
        assert_eq!(arena.get(h), Some(range(0, 4, 0, 7)));
    }

    #[test]
    fn test_multiline_remove_joins_lines() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(2, 3, 2, 8), GrowthPolicy::Stay);

        // Delete from (0,5) to (2,1): line 2 content lands on line 0 after col 5.
        arena.apply_remove(range(0, 5, 2, 1));
        assert_eq!(arena.get(h), Some(range(0, 7, 0, 12)));
    }

    #[test]
    fn test_stale_handle_is_inert() {
        let mut arena = IntervalArena::new();
        let h = arena.alloc(range(0, 0, 0, 3), GrowthPolicy::Stay);
        assert!(arena.release(h));
        assert!(!arena.release(h));
        assert_eq!(arena.get(h), None);

        // Slot reuse must not resurrect the old handle.
        let h2 = arena.alloc(range(0, 0, 0, 9), GrowthPolicy::Stay);
        assert_eq!(arena.get(h), None);
        assert_eq!(arena.get(h2), Some(range(0, 0, 0, 9)));
    }

    #[test]
    fn test_invalidate_all_reports_every_live_interval() {
        let mut arena = IntervalArena::new();
        let a = arena.alloc(range(0, 0, 0, 3), GrowthPolicy::Stay);
        let b = arena.alloc(range(1, 0, 1, 3), GrowthPolicy::Expand);
        arena.release(a);

        let events = arena.invalidate_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].handle, b);
        assert_eq!(events[0].kind, IntervalEventKind::Invalidated);
    }
}
