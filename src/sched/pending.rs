// src/sched/pending.rs

//! Pending launch entries and their handles.

use std::fmt;

use tokio::time::Instant;

use crate::config::LaunchTarget;

/// Handle returned by `enqueue`, used to cancel a launch before it fires.
///
/// Ids increase monotonically per scheduler, which also gives the tie-break
/// order for entries sharing a due time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaunchId(pub u64);

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A launch target waiting for its due time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLaunch {
    pub id: LaunchId,
    pub target: LaunchTarget,
    pub enqueued_at: Instant,
    /// `enqueued_at + target.delay_seconds`.
    pub due_at: Instant,
}

impl PendingLaunch {
    pub fn is_due(&self, now: Instant) -> bool {
        self.due_at <= now
    }
}
