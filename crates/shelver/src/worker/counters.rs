//! Run-scoped counters shared by all workers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Success/failure tallies for one run. Created by the scheduler, shared
/// with workers via `Arc`, read for the final summary and for the cutoff
/// message. All updates are atomic.
#[derive(Debug, Default)]
pub struct RunCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    cutoff_hit: AtomicBool,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks the cutoff as reached. Returns `true` on the first call so
    /// the triggering worker can log the event exactly once.
    pub fn mark_cutoff(&self) -> bool {
        !self.cutoff_hit.swap(true, Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn cutoff_hit(&self) -> bool {
        self.cutoff_hit.load(Ordering::Relaxed)
    }

    pub fn summary(&self, interrupted: bool) -> RunSummary {
        RunSummary {
            succeeded: self.succeeded(),
            failed: self.failed(),
            cutoff_hit: self.cutoff_hit(),
            interrupted,
        }
    }
}

/// Final accounting for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: u64,
    pub failed: u64,
    /// The time-box cutoff stopped at least one batch from starting.
    pub cutoff_hit: bool,
    /// An operator interrupt stopped the run early.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn empty() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            cutoff_hit: false,
            interrupted: false,
        }
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}
