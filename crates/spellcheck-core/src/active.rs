//! The single in-flight check.
//!
//! At most one job is ever bound to the backend session. The slot is either
//! idle or checking; "no active job" is the `None` state of an `Option`, and
//! stopping is synchronous and total: the job's interval is released and the
//! backend session told to stop, with no intermediate state.

use crate::collaborators::DecodedText;
use crate::interval::{IntervalArena, IntervalHandle};
use crate::position::DocRange;

/// The job currently handed to the backend session.
#[derive(Debug)]
pub struct ActiveJob {
    /// Tracked range being checked.
    pub interval: IntervalHandle,
    /// Dictionary the backend was given.
    pub dictionary: String,
    /// The decoded text submitted to the backend, with its offset map.
    pub decoded: DecodedText,
    /// The job's range at submission time. If the tracked range has drifted
    /// away from this (an edit elsewhere shifted it), the offset map is stale
    /// and the job must be restarted.
    pub started_range: DocRange,
}

/// Holder of the at-most-one active job.
#[derive(Debug, Default)]
pub struct ActiveSlot {
    job: Option<ActiveJob>,
}

impl ActiveSlot {
    /// Create an idle slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no job is in flight.
    pub fn is_idle(&self) -> bool {
        self.job.is_none()
    }

    /// The in-flight job, if any.
    pub fn job(&self) -> Option<&ActiveJob> {
        self.job.as_ref()
    }

    /// The in-flight job's current tracked range.
    pub fn range(&self, arena: &IntervalArena) -> Option<DocRange> {
        self.job.as_ref().and_then(|j| arena.get(j.interval))
    }

    /// Whether `handle` is the active job's interval.
    pub fn owns(&self, handle: IntervalHandle) -> bool {
        self.job.as_ref().is_some_and(|j| j.interval == handle)
    }

    /// Transition Idle -> Checking. The slot must be idle.
    pub fn begin(&mut self, job: ActiveJob) {
        debug_assert!(self.job.is_none(), "active slot already occupied");
        self.job = Some(job);
    }

    /// Transition Checking -> Idle, releasing the job's interval.
    /// Idempotent when already idle.
    pub fn finish(&mut self, arena: &mut IntervalArena) -> Option<ActiveJob> {
        let job = self.job.take()?;
        arena.release(job.interval);
        Some(job)
    }
}
