//! Work queues.
//!
//! [`ModificationQueue`] buffers raw edit notifications until the next engine
//! poll, so a burst of edits inside one event-loop turn is handled as a single
//! batch. [`CheckQueue`] holds the word-aligned check jobs waiting for the
//! backend; it is LIFO (freshest edits first) and maintains the invariant that
//! no two queued jobs overlap: an insertion that would overlap instead merges
//! into one job covering the union.

use std::collections::VecDeque;

use crate::interval::{GrowthPolicy, IntervalArena, IntervalHandle};
use crate::position::DocRange;

/// One buffered edit notification, backed by a tracked interval so it stays
/// correct if further edits land before the batch is drained.
///
/// Insertions and removals buffer identically: an insertion's interval covers
/// the new text, while a removal's coverage (the collapsed deletion point, or
/// the shifted remainder of a view) is folded into the range at notification
/// time. By the drain an item just means "recheck this range".
#[derive(Debug)]
pub struct ModificationItem {
    /// Tracked range of the edit.
    pub interval: IntervalHandle,
}

/// Deferred batch of edit notifications.
#[derive(Debug, Default)]
pub struct ModificationQueue {
    items: Vec<ModificationItem>,
    drain_scheduled: bool,
}

impl ModificationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item. The first item after a drain schedules the next one;
    /// later items ride along in the same batch.
    pub fn push(&mut self, arena: &mut IntervalArena, range: DocRange) {
        if self.items.is_empty() {
            self.drain_scheduled = true;
        }
        let interval = arena.alloc(range, GrowthPolicy::Expand);
        self.items.push(ModificationItem { interval });
    }

    /// Whether a drain is pending.
    pub fn drain_scheduled(&self) -> bool {
        self.drain_scheduled
    }

    /// Take the whole batch, in arrival order, clearing the schedule flag.
    pub fn take_batch(&mut self) -> Vec<ModificationItem> {
        self.drain_scheduled = false;
        std::mem::take(&mut self.items)
    }

    /// Drop the item owning `handle` (lifecycle event routing).
    pub fn remove_interval(&mut self, arena: &mut IntervalArena, handle: IntervalHandle) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.interval != handle);
        if before != self.items.len() {
            arena.release(handle);
            true
        } else {
            false
        }
    }

    /// Discard everything, releasing the tracked intervals.
    pub fn clear(&mut self, arena: &mut IntervalArena) {
        for item in self.items.drain(..) {
            arena.release(item.interval);
        }
        self.drain_scheduled = false;
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A pending check job: a word-aligned tracked range and the dictionary to
/// check it against.
#[derive(Debug)]
pub struct CheckJob {
    /// Tracked range to validate.
    pub interval: IntervalHandle,
    /// Dictionary name for the backend.
    pub dictionary: String,
}

/// Ordered collection of pending check jobs.
///
/// Jobs are popped from the front and new jobs are inserted at the front:
/// newly-typed text is the highest-value target, so the queue is deliberately
/// LIFO.
#[derive(Debug, Default)]
pub struct CheckQueue {
    jobs: VecDeque<CheckJob>,
}

impl CheckQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every queued job interacting with `range` out of the queue,
    /// returning the union of `range` and all removed jobs' ranges.
    ///
    /// Uses [`DocRange::interacts`] so a collapsed deletion point still merges
    /// with the job covering it. Runs to a fixpoint: a union that has grown
    /// can overlap jobs it did not initially touch.
    pub fn merge_out_overlapping(
        &mut self,
        arena: &mut IntervalArena,
        range: DocRange,
    ) -> DocRange {
        let mut merged = range;
        loop {
            let mut changed = false;
            self.jobs.retain(|job| match arena.get(job.interval) {
                Some(r) if r.interacts(&merged) => {
                    merged = merged.union(&r);
                    arena.release(job.interval);
                    changed = true;
                    false
                }
                Some(_) => true,
                // Interval already gone: the job is dead weight.
                None => false,
            });
            if !changed {
                break;
            }
        }
        merged
    }

    /// Insert a job at the front, first merging away any overlapping jobs.
    ///
    /// On a merge the incoming dictionary wins; callers partition by
    /// dictionary before enqueueing, so a cross-dictionary union is already a
    /// transient state.
    pub fn enqueue(&mut self, arena: &mut IntervalArena, range: DocRange, dictionary: String) {
        let merged = self.merge_out_overlapping(arena, range);
        if merged.is_empty() {
            return;
        }
        let interval = arena.alloc(merged, GrowthPolicy::Expand);
        self.jobs.push_front(CheckJob {
            interval,
            dictionary,
        });
    }

    /// Pop the most recently enqueued job.
    pub fn pop(&mut self) -> Option<CheckJob> {
        self.jobs.pop_front()
    }

    /// Drop the job owning `handle` (lifecycle event routing).
    pub fn remove_interval(&mut self, arena: &mut IntervalArena, handle: IntervalHandle) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.interval != handle);
        if before != self.jobs.len() {
            arena.release(handle);
            true
        } else {
            false
        }
    }

    /// Discard everything, releasing the tracked intervals.
    pub fn clear(&mut self, arena: &mut IntervalArena) {
        for job in self.jobs.drain(..) {
            arena.release(job.interval);
        }
    }

    /// Iterate the queued jobs front (freshest) to back.
    pub fn iter(&self) -> impl Iterator<Item = &CheckJob> {
        self.jobs.iter()
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sc: usize, ec: usize) -> DocRange {
        DocRange::from_coords(0, sc, 0, ec)
    }

    #[test]
    fn test_modification_queue_batches() {
        let mut arena = IntervalArena::new();
        let mut queue = ModificationQueue::new();

        assert!(!queue.drain_scheduled());
        queue.push(&mut arena, range(0, 3));
        assert!(queue.drain_scheduled());
        queue.push(&mut arena, range(5, 5));
        assert_eq!(queue.len(), 2);

        let batch = queue.take_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(arena.get(batch[0].interval), Some(range(0, 3)));
        assert_eq!(arena.get(batch[1].interval), Some(range(5, 5)));
        assert!(!queue.drain_scheduled());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_check_queue_is_lifo() {
        let mut arena = IntervalArena::new();
        let mut queue = CheckQueue::new();

        queue.enqueue(&mut arena, range(0, 3), "en".into());
        queue.enqueue(&mut arena, range(10, 13), "en".into());

        let first = queue.pop().unwrap();
        assert_eq!(arena.get(first.interval), Some(range(10, 13)));
        let second = queue.pop().unwrap();
        assert_eq!(arena.get(second.interval), Some(range(0, 3)));
    }

    #[test]
    fn test_enqueue_merges_overlap_into_union() {
        let mut arena = IntervalArena::new();
        let mut queue = CheckQueue::new();

        queue.enqueue(&mut arena, range(0, 5), "en".into());
        queue.enqueue(&mut arena, range(8, 12), "en".into());
        queue.enqueue(&mut arena, range(3, 9), "fr".into());

        // All three overlap transitively: one job covering the union.
        assert_eq!(queue.len(), 1);
        let job = queue.pop().unwrap();
        assert_eq!(arena.get(job.interval), Some(range(0, 12)));
        assert_eq!(job.dictionary, "fr");
        assert_eq!(arena.live_count(), 1);
        arena.release(job.interval);
    }

    #[test]
    fn test_no_overlap_invariant_after_random_enqueues() {
        let mut arena = IntervalArena::new();
        let mut queue = CheckQueue::new();

        for (s, e) in [(0, 4), (10, 14), (2, 11), (20, 25), (24, 30), (5, 6)] {
            queue.enqueue(&mut arena, range(s, e), "en".into());

            let ranges: Vec<DocRange> = queue
                .iter()
                .map(|j| arena.get(j.interval).unwrap())
                .collect();
            for (i, a) in ranges.iter().enumerate() {
                for b in ranges.iter().skip(i + 1) {
                    assert!(!a.overlaps(b), "queued jobs overlap: {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn test_remove_interval_releases_handle() {
        let mut arena = IntervalArena::new();
        let mut queue = CheckQueue::new();

        queue.enqueue(&mut arena, range(0, 5), "en".into());
        let handle = queue.iter().next().unwrap().interval;
        assert!(queue.remove_interval(&mut arena, handle));
        assert!(!queue.remove_interval(&mut arena, handle));
        assert!(queue.is_empty());
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_merge_out_overlapping_reaches_fixpoint() {
        let mut arena = IntervalArena::new();
        let mut queue = CheckQueue::new();

        // Two disjoint jobs bridged only by the probe range.
        queue.enqueue(&mut arena, range(0, 4), "en".into());
        queue.enqueue(&mut arena, range(8, 12), "en".into());

        let merged = queue.merge_out_overlapping(&mut arena, range(3, 9));
        assert_eq!(merged, range(0, 12));
        assert!(queue.is_empty());
        assert_eq!(arena.live_count(), 0);
    }
}
