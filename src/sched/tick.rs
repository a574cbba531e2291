use crate::sched::pending::PendingLaunch;

/// Result of a single scheduler tick.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Launches that became due, ordered by due time then enqueue order.
    /// They have already been removed from the pending set.
    pub due: Vec<PendingLaunch>,
    /// Entries still waiting after this tick.
    pub remaining: usize,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}
