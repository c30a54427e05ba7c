//! Per-view visibility tracking.
//!
//! Each open view remembers its last visible range. When a view scrolls, the
//! change is debounced (a short coalescing delay, so a continuous scroll is
//! processed once) and then diffed against the remembered range:
//!
//! - lines no longer visible in *any* view feed misspelling pruning;
//! - lines newly exposed feed the partitioner for checking.
//!
//! Only one change is ever pending: if a second view scrolls while another
//! view's change is still waiting, the waiting one is flushed first
//! (process-then-replace).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::position::{DocRange, Position};

/// Opaque identifier for an open view of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
    /// Create a view id from a raw numeric identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An inclusive span of line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    first: usize,
    last: usize,
}

impl LineSpan {
    fn of_range(range: &DocRange) -> Option<LineSpan> {
        if range.is_empty() {
            return None;
        }
        // A range ending at column 0 does not cover its end line.
        let last = if range.end.column == 0 && range.end.line > range.start.line {
            range.end.line - 1
        } else {
            range.end.line
        };
        Some(LineSpan {
            first: range.start.line,
            last,
        })
    }

    fn to_range(self) -> DocRange {
        DocRange::new(
            Position::new(self.first, 0),
            Position::new(self.last + 1, 0),
        )
    }

    /// `self` minus `other`: zero, one, or two spans.
    fn subtract(self, other: LineSpan) -> Vec<LineSpan> {
        if other.last < self.first || other.first > self.last {
            return vec![self];
        }
        let mut parts = Vec::new();
        if other.first > self.first {
            parts.push(LineSpan {
                first: self.first,
                last: other.first - 1,
            });
        }
        if other.last < self.last {
            parts.push(LineSpan {
                first: other.last + 1,
                last: self.last,
            });
        }
        parts
    }
}

fn subtract_all(spans: Vec<LineSpan>, other: LineSpan) -> Vec<LineSpan> {
    spans.into_iter().flat_map(|s| s.subtract(other)).collect()
}

/// The outcome of flushing one view's visibility change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibilityDelta {
    /// Full-line ranges that left visibility everywhere; overlapping
    /// misspelled entries should be pruned.
    pub hidden: Vec<DocRange>,
    /// Full-line ranges newly exposed in this view; they need checking.
    pub exposed: Vec<DocRange>,
}

impl VisibilityDelta {
    /// Whether the flush found nothing to do.
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty() && self.exposed.is_empty()
    }
}

#[derive(Debug)]
struct PendingChange {
    view: ViewId,
    new_range: DocRange,
    due: Instant,
}

/// Tracks every open view's last processed visible range plus the one
/// pending (debounced) change.
#[derive(Debug, Default)]
pub struct ViewVisibilityTracker {
    views: BTreeMap<ViewId, DocRange>,
    pending: Option<PendingChange>,
}

impl ViewVisibilityTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly created view with its initial visible range.
    pub fn register(&mut self, view: ViewId, visible: DocRange) {
        self.views.insert(view, visible);
    }

    /// Forget a closed view. Returns the visibility delta of its range
    /// disappearing (lines not covered by any surviving view).
    pub fn forget(&mut self, view: ViewId) -> VisibilityDelta {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.view == view)
        {
            self.pending = None;
        }
        let Some(old) = self.views.remove(&view) else {
            return VisibilityDelta::default();
        };
        VisibilityDelta {
            hidden: self.uncovered_spans(old, None),
            exposed: Vec::new(),
        }
    }

    /// The last processed visible range of `view`.
    pub fn visible_range(&self, view: ViewId) -> Option<DocRange> {
        self.views.get(&view).copied()
    }

    /// All views with their last processed visible ranges.
    pub fn views(&self) -> impl Iterator<Item = (ViewId, DocRange)> + '_ {
        self.views.iter().map(|(&v, &r)| (v, r))
    }

    /// Whether `pos`' line is visible in at least one view.
    pub fn line_visible_anywhere(&self, line: usize) -> bool {
        self.views.values().any(|r| {
            LineSpan::of_range(r).is_some_and(|s| s.first <= line && line <= s.last)
        })
    }

    /// Record a visible-range change for `view`, debounced by `debounce`.
    ///
    /// If a change for a *different* view is already pending, it is flushed
    /// first and its delta returned (process-then-replace); a pending change
    /// for the same view is simply coalesced into this one.
    pub fn record_change(
        &mut self,
        view: ViewId,
        new_range: DocRange,
        now: Instant,
        debounce: Duration,
    ) -> Option<VisibilityDelta> {
        let flushed = match self.pending.take() {
            Some(p) if p.view != view => Some(self.flush(p)),
            // A same-view pending change is coalesced: the replacement below
            // supersedes it.
            _ => None,
        };
        self.pending = Some(PendingChange {
            view,
            new_range,
            due: now + debounce,
        });
        flushed
    }

    /// Flush the pending change if its debounce delay has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<VisibilityDelta> {
        if self.pending.as_ref().is_some_and(|p| now >= p.due) {
            self.pending.take().map(|p| self.flush(p))
        } else {
            None
        }
    }

    fn flush(&mut self, change: PendingChange) -> VisibilityDelta {
        let old = self
            .views
            .insert(change.view, change.new_range)
            .unwrap_or(DocRange::collapsed(Position::start()));
        let new = change.new_range;

        // Old-but-not-new lines, minus every other view's coverage.
        let hidden = self.uncovered_spans(old, Some(new));

        // New-but-not-old lines need checking regardless of other views.
        let exposed = match (LineSpan::of_range(&new), LineSpan::of_range(&old)) {
            (Some(n), Some(o)) => subtract_all(vec![n], o),
            (Some(n), None) => vec![n],
            (None, _) => Vec::new(),
        }
        .into_iter()
        .map(LineSpan::to_range)
        .collect();

        VisibilityDelta { hidden, exposed }
    }

    /// Lines of `old` covered neither by `replacement` nor by any view's
    /// current range.
    fn uncovered_spans(&self, old: DocRange, replacement: Option<DocRange>) -> Vec<DocRange> {
        let Some(old_span) = LineSpan::of_range(&old) else {
            return Vec::new();
        };
        let mut spans = vec![old_span];
        if let Some(r) = replacement.as_ref().and_then(LineSpan::of_range) {
            spans = subtract_all(spans, r);
        }
        for visible in self.views.values() {
            let Some(s) = LineSpan::of_range(visible) else {
                continue;
            };
            spans = subtract_all(spans, s);
            if spans.is_empty() {
                break;
            }
        }
        spans.into_iter().map(LineSpan::to_range).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(first: usize, last_exclusive: usize) -> DocRange {
        DocRange::from_coords(first, 0, last_exclusive, 0)
    }

    fn now() -> Instant {
        Instant::now()
    }

    #[test]
    fn test_scroll_exposes_and_hides_lines() {
        let mut tracker = ViewVisibilityTracker::new();
        let v = ViewId::new(1);
        tracker.register(v, lines(0, 50));

        assert!(
            tracker
                .record_change(v, lines(30, 80), now(), Duration::ZERO)
                .is_none()
        );
        let delta = tracker.take_due(now()).unwrap();
        assert_eq!(delta.hidden, vec![lines(0, 30)]);
        assert_eq!(delta.exposed, vec![lines(50, 80)]);
        assert_eq!(tracker.visible_range(v), Some(lines(30, 80)));
    }

    #[test]
    fn test_other_view_keeps_lines_alive() {
        let mut tracker = ViewVisibilityTracker::new();
        let v1 = ViewId::new(1);
        let v2 = ViewId::new(2);
        tracker.register(v1, lines(0, 50));
        tracker.register(v2, lines(40, 90));

        // V1 scrolls away from [0,50); lines [40,50) stay visible in V2.
        tracker.record_change(v1, lines(60, 110), now(), Duration::ZERO);
        let delta = tracker.take_due(now()).unwrap();
        assert_eq!(delta.hidden, vec![lines(0, 40)]);
        assert_eq!(delta.exposed, vec![lines(60, 110)]);
    }

    #[test]
    fn test_pending_change_for_other_view_flushes_first() {
        let mut tracker = ViewVisibilityTracker::new();
        let v1 = ViewId::new(1);
        let v2 = ViewId::new(2);
        tracker.register(v1, lines(0, 10));
        tracker.register(v2, lines(50, 60));

        let long = Duration::from_secs(3600);
        assert!(tracker.record_change(v1, lines(5, 15), now(), long).is_none());
        // V2 scrolls while V1's change is still pending: V1 flushes now.
        let flushed = tracker
            .record_change(v2, lines(55, 65), now(), long)
            .unwrap();
        assert_eq!(flushed.exposed, vec![lines(10, 15)]);
        assert_eq!(tracker.visible_range(v1), Some(lines(5, 15)));
        // V2's own change is still debounced.
        assert!(tracker.take_due(now()).is_none());
    }

    #[test]
    fn test_same_view_changes_coalesce() {
        let mut tracker = ViewVisibilityTracker::new();
        let v = ViewId::new(1);
        tracker.register(v, lines(0, 10));

        assert!(
            tracker
                .record_change(v, lines(5, 15), now(), Duration::ZERO)
                .is_none()
        );
        assert!(
            tracker
                .record_change(v, lines(20, 30), now(), Duration::ZERO)
                .is_none()
        );
        let delta = tracker.take_due(now()).unwrap();
        // Only the final range counts; the intermediate one was coalesced.
        assert_eq!(delta.hidden, vec![lines(0, 10)]);
        assert_eq!(delta.exposed, vec![lines(20, 30)]);
    }

    #[test]
    fn test_forget_view_hides_uncovered_lines() {
        let mut tracker = ViewVisibilityTracker::new();
        let v1 = ViewId::new(1);
        let v2 = ViewId::new(2);
        tracker.register(v1, lines(0, 50));
        tracker.register(v2, lines(40, 90));

        let delta = tracker.forget(v1);
        assert_eq!(delta.hidden, vec![lines(0, 40)]);
        assert!(tracker.visible_range(v1).is_none());
    }

    #[test]
    fn test_scroll_inside_old_range_is_noop() {
        let mut tracker = ViewVisibilityTracker::new();
        let v = ViewId::new(1);
        tracker.register(v, lines(0, 100));

        tracker.record_change(v, lines(10, 90), now(), Duration::ZERO);
        let delta = tracker.take_due(now()).unwrap();
        assert!(delta.exposed.is_empty());
        // Shrinking leaves [0,10) and [90,100) uncovered.
        assert_eq!(delta.hidden, vec![lines(0, 10), lines(90, 100)]);
    }
}
