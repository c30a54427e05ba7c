//! The on-the-fly checking engine.
//!
//! [`OnTheFlyEngine`] ties the pieces together: edits arrive through
//! [`on_text_inserted`](OnTheFlyEngine::on_text_inserted) /
//! [`on_text_removed`](OnTheFlyEngine::on_text_removed), scrolls through
//! [`visible_range_changed`](OnTheFlyEngine::visible_range_changed), and the
//! host drives everything by calling [`poll`](OnTheFlyEngine::poll) once per
//! event-loop iteration. Nothing heavyweight ever runs inside a notification:
//! edits are buffered and processed in the next poll, scrolls are debounced,
//! and the backend session is pumped cooperatively.
//!
//! Results surface as [`CheckEvent`]s through subscribe callbacks, the same
//! pattern as a state-change subscription. The engine never fails the host:
//! with no backend session installed it simply finds nothing misspelled.

use std::time::{Duration, Instant};

use crate::active::{ActiveJob, ActiveSlot};
use crate::collaborators::{CheckContext, SessionEvent, ValidationSession};
use crate::interval::{GrowthPolicy, IntervalArena, IntervalEvent, IntervalHandle};
use crate::misspellings::MisspelledSet;
use crate::partition;
use crate::position::{DocRange, Position};
use crate::queue::{CheckQueue, ModificationQueue};
use crate::visibility::{ViewId, ViewVisibilityTracker, VisibilityDelta};

/// Tunables for the engine's deferred processing.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Coalescing delay applied to visible-range changes before they are
    /// processed. Zero means "on the next poll".
    pub visibility_debounce: Duration,
    /// Maximum number of backend session events handled per poll, so one
    /// poll cannot monopolize the host's loop on a large document.
    pub session_poll_budget: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visibility_debounce: Duration::from_millis(100),
            session_poll_budget: 128,
        }
    }
}

/// A notification produced by the engine for the rendering/menu layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckEvent {
    /// A word failed validation; underline `range`.
    MisspellingFound {
        /// The misspelled word's document range.
        range: DocRange,
        /// The dictionary that flagged it.
        dictionary: String,
    },
    /// A previously flagged range is no longer flagged (edited, re-checked
    /// clean, scrolled out of every view, or accepted by the user).
    MisspellingCleared {
        /// The range that was flagged.
        range: DocRange,
    },
    /// The flagged range the caret was sitting in went away.
    MisspelledRangeDeleted {
        /// The last known range.
        range: DocRange,
    },
    /// The caret moved into a flagged range.
    CaretEnteredMisspelledRange {
        /// The range under the caret.
        range: DocRange,
    },
    /// The caret left a flagged range.
    CaretExitedMisspelledRange {
        /// The range the caret left.
        range: DocRange,
    },
}

/// Subscriber callback for [`CheckEvent`]s.
pub type CheckEventCallback = Box<dyn FnMut(&CheckEvent) + Send>;

/// The incremental on-the-fly validation engine.
///
/// Single-threaded and lock-free: every entry point runs to completion on the
/// caller's thread, and all deferred work happens inside
/// [`poll`](Self::poll). Edits outside every view's visible range are ignored
/// (nothing to validate if nothing is shown), so the engine is inert until
/// the host registers a view via [`view_created`](Self::view_created).
pub struct OnTheFlyEngine {
    arena: IntervalArena,
    modifications: ModificationQueue,
    check_queue: CheckQueue,
    active: ActiveSlot,
    misspellings: MisspelledSet,
    visibility: ViewVisibilityTracker,
    session: Option<Box<dyn ValidationSession>>,
    callbacks: Vec<CheckEventCallback>,
    caret: Option<Position>,
    caret_range: Option<DocRange>,
    config: EngineConfig,
}

impl OnTheFlyEngine {
    /// Create an engine with a backend session.
    pub fn new(session: Box<dyn ValidationSession>) -> Self {
        Self::with_config(Some(session), EngineConfig::default())
    }

    /// Create an engine with no backend: everything validates trivially
    /// (degraded mode, never an error).
    pub fn without_backend() -> Self {
        Self::with_config(None, EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(session: Option<Box<dyn ValidationSession>>, config: EngineConfig) -> Self {
        Self {
            arena: IntervalArena::new(),
            modifications: ModificationQueue::new(),
            check_queue: CheckQueue::new(),
            active: ActiveSlot::new(),
            misspellings: MisspelledSet::new(),
            visibility: ViewVisibilityTracker::new(),
            session,
            callbacks: Vec::new(),
            caret: None,
            caret_range: None,
            config,
        }
    }

    /// Subscribe to engine notifications.
    pub fn subscribe(&mut self, callback: CheckEventCallback) {
        self.callbacks.push(callback);
    }

    // --- edit notifications -------------------------------------------------

    /// Notify the engine that `inserted` now covers freshly inserted text
    /// (post-edit coordinates).
    pub fn on_text_inserted(&mut self, ctx: &CheckContext<'_>, inserted: DocRange) {
        let events = self.arena.apply_insert(inserted);
        self.route_interval_events(events);

        let Some(clamped) = inserted.intersect(&ctx.document.document_range()) else {
            return;
        };
        let visible: Vec<DocRange> = self.visibility.views().map(|(_, r)| r).collect();
        for view_range in visible {
            if let Some(part) = clamped.intersect(&view_range) {
                self.modifications.push(&mut self.arena, part);
            }
        }
    }

    /// Notify the engine that the text under `removed` (pre-edit coordinates)
    /// was deleted.
    pub fn on_text_removed(&mut self, ctx: &CheckContext<'_>, removed: DocRange) {
        let events = self.arena.apply_remove(removed);
        self.route_interval_events(events);

        let doc_range = ctx.document.document_range();
        let anchor = removed.start.min(doc_range.end);
        let whole_lines_removed = removed.line_span() >= 1;

        let visible: Vec<DocRange> = self.visibility.views().map(|(_, r)| r).collect();
        for view_range in visible {
            if whole_lines_removed && anchor < view_range.end {
                // Everything below the deletion point shifted up; the view's
                // remaining coverage needs rechecking.
                let start = anchor.max(view_range.start);
                let end = view_range.end.min(doc_range.end);
                if start <= end {
                    self.modifications
                        .push(&mut self.arena, DocRange::new(start, end));
                }
            } else if view_range.contains(anchor) || view_range.end == anchor {
                self.modifications
                    .push(&mut self.arena, DocRange::collapsed(anchor));
            }
        }
    }

    // --- view notifications -------------------------------------------------

    /// Register a newly opened view and rescan all visible regions.
    pub fn view_created(&mut self, ctx: &CheckContext<'_>, view: ViewId, visible: DocRange) {
        self.visibility.register(view, visible);
        self.rescan(ctx);
    }

    /// Record a scroll of `view`; processing is debounced until the next poll
    /// after the coalescing delay (unless displaced by another view's change).
    pub fn visible_range_changed(&mut self, ctx: &CheckContext<'_>, view: ViewId, visible: DocRange) {
        if let Some(delta) = self.visibility.record_change(
            view,
            visible,
            Instant::now(),
            self.config.visibility_debounce,
        ) {
            self.apply_visibility_delta(ctx, delta);
        }
    }

    /// Forget a closed view, pruning entries now visible nowhere.
    pub fn view_closed(&mut self, ctx: &CheckContext<'_>, view: ViewId) {
        let delta = self.visibility.forget(view);
        self.apply_visibility_delta(ctx, delta);
    }

    /// The document's highlighting mode changed: every cached classification
    /// is void, so rescan the visible regions.
    pub fn highlighting_changed(&mut self, ctx: &CheckContext<'_>) {
        self.rescan(ctx);
    }

    /// The document was reloaded: discard all state and rescan.
    pub fn document_reloaded(&mut self, ctx: &CheckContext<'_>) {
        let events = self.arena.invalidate_all();
        self.route_interval_events(events);
        self.rescan(ctx);
    }

    // --- caret --------------------------------------------------------------

    /// Track the caret for enter/exit notifications on flagged ranges.
    pub fn set_caret_position(&mut self, pos: Position) {
        self.caret = Some(pos);
        self.refresh_caret_range();
    }

    // --- user acceptance ----------------------------------------------------

    /// The user accepted `word` permanently: forward to the backend's
    /// personal list and drop every matching entry.
    pub fn add_word_to_personal_list(&mut self, ctx: &CheckContext<'_>, word: &str) {
        if let Some(session) = self.session.as_mut() {
            session.add_word_to_personal_list(word);
        }
        self.forget_word(ctx, word);
    }

    /// The user accepted `word` for this session only.
    pub fn add_word_to_session_ignore_list(&mut self, ctx: &CheckContext<'_>, word: &str) {
        if let Some(session) = self.session.as_mut() {
            session.add_word_to_session_ignore_list(word);
        }
        self.forget_word(ctx, word);
    }

    // --- queries ------------------------------------------------------------

    /// The flagged range covering `pos`, with its dictionary.
    pub fn misspelled_range_at(&self, pos: Position) -> Option<(DocRange, String)> {
        self.misspellings
            .entry_at(&self.arena, pos)
            .map(|(r, d)| (r, d.to_string()))
    }

    /// The dictionary of the entry exactly covering `range`.
    pub fn dictionary_for_exact_range(&self, range: DocRange) -> Option<String> {
        self.misspellings
            .entry_for_exact_range(&self.arena, range)
            .map(str::to_string)
    }

    /// All flagged `(range, dictionary)` pairs, ordered by start.
    pub fn misspellings(&self) -> Vec<(DocRange, String)> {
        self.misspellings.all(&self.arena)
    }

    /// The current document text under a flagged range (re-derived, never
    /// cached), or `None` when `range` is not flagged.
    pub fn misspelled_word(&self, ctx: &CheckContext<'_>, range: DocRange) -> Option<String> {
        self.misspellings
            .entry_for_exact_range(&self.arena, range)?;
        Some(ctx.document.decode(range).text)
    }

    /// Number of jobs waiting for the backend.
    pub fn queued_job_count(&self) -> usize {
        self.check_queue.len()
    }

    /// Whether a job is currently bound to the backend session.
    pub fn has_active_job(&self) -> bool {
        !self.active.is_idle()
    }

    /// Number of live tracked intervals (bookkeeping introspection).
    pub fn tracked_interval_count(&self) -> usize {
        self.arena.live_count()
    }

    // --- the scheduler iteration -------------------------------------------

    /// Run one engine iteration: drain buffered edits, flush a due visibility
    /// change, and pump the backend session.
    ///
    /// The host calls this once per event-loop turn.
    pub fn poll(&mut self, ctx: &CheckContext<'_>) {
        self.drain_modifications(ctx);
        if let Some(delta) = self.visibility.take_due(Instant::now()) {
            self.apply_visibility_delta(ctx, delta);
        }
        self.pump(ctx);
    }

    // --- internals ----------------------------------------------------------

    fn emit(&mut self, event: CheckEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    fn refresh_caret_range(&mut self) {
        let new = self
            .caret
            .and_then(|pos| self.misspellings.entry_at(&self.arena, pos).map(|(r, _)| r));
        if new == self.caret_range {
            return;
        }
        if let Some(old) = self.caret_range.take() {
            self.emit(CheckEvent::CaretExitedMisspelledRange { range: old });
        }
        if let Some(range) = new {
            self.emit(CheckEvent::CaretEnteredMisspelledRange { range });
        }
        self.caret_range = new;
    }

    fn note_cleared(&mut self, ranges: Vec<DocRange>) {
        for range in ranges {
            if self.caret_range == Some(range) {
                self.emit(CheckEvent::MisspelledRangeDeleted { range });
            }
            self.emit(CheckEvent::MisspellingCleared { range });
        }
        self.refresh_caret_range();
    }

    fn forget_word(&mut self, ctx: &CheckContext<'_>, word: &str) {
        let removed =
            self.misspellings
                .remove_entries_for_word(&mut self.arena, ctx.document, word);
        self.note_cleared(removed);
    }

    /// Route arena lifecycle events to whichever structure owns each interval.
    /// Every removal path is idempotent; "already gone" is fine.
    fn route_interval_events(&mut self, events: Vec<IntervalEvent>) {
        for event in events {
            self.drop_interval(event.handle);
        }
    }

    fn drop_interval(&mut self, handle: IntervalHandle) {
        if self.active.owns(handle) {
            self.stop_active_job();
            return;
        }
        if self.check_queue.remove_interval(&mut self.arena, handle) {
            return;
        }
        if self.modifications.remove_interval(&mut self.arena, handle) {
            return;
        }
        if let Some(range) = self.misspellings.remove_interval(&mut self.arena, handle) {
            self.note_cleared(vec![range]);
        }
    }

    /// Stop the active job: synchronous and total.
    fn stop_active_job(&mut self) {
        if self.active.finish(&mut self.arena).is_some() {
            if let Some(session) = self.session.as_mut() {
                session.stop();
            }
        }
    }

    fn drain_modifications(&mut self, ctx: &CheckContext<'_>) {
        if !self.modifications.drain_scheduled() {
            return;
        }
        for item in self.modifications.take_batch() {
            let Some(range) = self.arena.get(item.interval) else {
                continue;
            };
            self.arena.release(item.interval);
            // Insertions and removals drain identically; any
            // removal-specific coverage was folded into the item's range at
            // notification time.
            self.handle_edit(ctx, range);
        }
    }

    fn handle_edit(&mut self, ctx: &CheckContext<'_>, edited: DocRange) {
        let mut considered = edited;

        if let Some(active_range) = self.active.range(&self.arena) {
            if active_range.interacts(&considered) {
                considered = considered.union(&active_range);
                self.stop_active_job();
            }
        }
        considered = self
            .check_queue
            .merge_out_overlapping(&mut self.arena, considered);

        self.schedule_check(ctx, considered);
    }

    /// Word-align `range`, partition it, and enqueue the resulting jobs.
    ///
    /// An empty `range` is meaningful here: a collapsed deletion point inside
    /// a word still expands to that whole word.
    fn schedule_check(&mut self, ctx: &CheckContext<'_>, range: DocRange) {
        let clamped = clamp_to_document(ctx, range);
        let aligned = partition::find_word_boundaries(ctx.document, clamped);
        for (piece, dictionary) in partition::partition(ctx, aligned) {
            self.check_queue
                .enqueue(&mut self.arena, piece, dictionary);
        }
    }

    fn apply_visibility_delta(&mut self, ctx: &CheckContext<'_>, delta: VisibilityDelta) {
        for hidden in delta.hidden {
            let removed = self
                .misspellings
                .remove_overlapping(&mut self.arena, hidden);
            self.note_cleared(removed);
        }
        for exposed in delta.exposed {
            self.schedule_check(ctx, exposed);
        }
    }

    /// Discard all scheduled and reported state, then re-submit every view's
    /// currently visible region.
    fn rescan(&mut self, ctx: &CheckContext<'_>) {
        self.stop_active_job();
        self.check_queue.clear(&mut self.arena);
        self.modifications.clear(&mut self.arena);
        let cleared = self.misspellings.clear(&mut self.arena);
        self.note_cleared(cleared);

        let visible: Vec<DocRange> = self.visibility.views().map(|(_, r)| r).collect();
        for range in visible {
            self.schedule_check(ctx, range);
        }
    }

    /// Pop jobs and pump the backend until idle with an empty queue, the
    /// session goes quiet, or the per-poll budget runs out.
    fn pump(&mut self, ctx: &CheckContext<'_>) {
        let mut budget = self.config.session_poll_budget.max(1);

        loop {
            if self.active.is_idle() && !self.start_next_job(ctx) {
                return;
            }

            // An edit elsewhere may have shifted the job since submission;
            // the offset map would lie, so restart on the current range.
            if let Some(job) = self.active.job() {
                let current = self.arena.get(job.interval);
                if current != Some(job.started_range) {
                    let dictionary = job.dictionary.clone();
                    let range = current;
                    self.stop_active_job();
                    if let Some(range) = range {
                        self.check_queue
                            .enqueue(&mut self.arena, range, dictionary);
                    }
                    continue;
                }
            }

            let Some(event) = self.session.as_mut().and_then(|s| s.poll()) else {
                return;
            };
            match event {
                SessionEvent::Misspelling { word, offset } => {
                    self.record_misspelling(&word, offset);
                    if let Some(session) = self.session.as_mut() {
                        session.continue_checking();
                    }
                }
                SessionEvent::Done => {
                    self.active.finish(&mut self.arena);
                }
            }

            budget -= 1;
            if budget == 0 {
                return;
            }
        }
    }

    /// Idle -> Checking, if any queued job survives its preconditions.
    /// Returns whether a job is now active.
    fn start_next_job(&mut self, ctx: &CheckContext<'_>) -> bool {
        while let Some(job) = self.check_queue.pop() {
            let Some(range) = self.arena.get(job.interval) else {
                continue;
            };
            if range.is_empty() {
                self.arena.release(job.interval);
                continue;
            }

            // Stale results must be gone before fresh ones can arrive.
            let cleared = self
                .misspellings
                .remove_overlapping(&mut self.arena, range);
            self.note_cleared(cleared);

            let decoded = ctx.document.decode(range);
            if decoded.is_empty() {
                // Empty input is trivially successful.
                self.arena.release(job.interval);
                continue;
            }
            let Some(session) = self.session.as_mut() else {
                // No backend: degrade to "nothing is misspelled".
                self.arena.release(job.interval);
                continue;
            };
            session.set_dictionary(&job.dictionary);
            session.start(&decoded.text);
            self.active.begin(ActiveJob {
                interval: job.interval,
                dictionary: job.dictionary,
                decoded,
                started_range: range,
            });
            return true;
        }
        false
    }

    /// Map a backend-reported misspelling back to document coordinates and
    /// record it.
    fn record_misspelling(&mut self, word: &str, offset: usize) {
        let Some(job) = self.active.job() else {
            return;
        };
        let Some(job_range) = self.arena.get(job.interval) else {
            return;
        };
        let Some(start) = job.decoded.map_offset(offset) else {
            return;
        };
        let len = word.chars().count();
        let end = job
            .decoded
            .map_offset(offset + len)
            .unwrap_or(job_range.end);
        if start >= end {
            return;
        }

        let range = DocRange::new(start, end);
        let dictionary = job.dictionary.clone();
        let interval = self.arena.alloc(range, GrowthPolicy::Stay);
        self.misspellings
            .insert(&self.arena, interval, dictionary.clone());
        self.emit(CheckEvent::MisspellingFound { range, dictionary });
        self.refresh_caret_range();
    }
}

fn clamp_to_document(ctx: &CheckContext<'_>, range: DocRange) -> DocRange {
    let doc_end = ctx.document.document_range().end;
    DocRange::new(range.start.min(doc_end), range.end.min(doc_end))
}
