use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::LaunchTarget;
use crate::sched::pending::{LaunchId, PendingLaunch};
use crate::sched::tick::TickOutcome;

/// Deferred launch queue.
///
/// Entries are kept ordered by `(due_at, id)`. Since ids are handed out in
/// enqueue order, entries sharing a due time come out first-in first-out.
///
/// The scheduler never reads the clock itself; callers pass `now`. That
/// keeps it a plain state machine that the async runtime drives from its
/// ticker and that tests can drive with synthetic instants.
#[derive(Debug, Default)]
pub struct LaunchScheduler {
    queue: BTreeMap<(Instant, LaunchId), PendingLaunch>,
    /// id -> due time, for cancellation.
    index: HashMap<LaunchId, Instant>,
    next_id: u64,
}

impl LaunchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Add a launch due `delay_seconds` after `now`.
    ///
    /// A zero delay is due immediately but still only fires on the next
    /// tick; nothing fires from inside `enqueue`.
    pub fn enqueue(&mut self, target: LaunchTarget, now: Instant) -> LaunchId {
        let id = LaunchId(self.next_id);
        self.next_id += 1;

        let due_at = now + Duration::from_secs(u64::from(target.delay_seconds));
        debug!(
            launch_id = %id,
            target = %target.target_name,
            group = %target.group,
            delay_seconds = target.delay_seconds,
            "enqueued launch"
        );

        self.index.insert(id, due_at);
        self.queue.insert(
            (due_at, id),
            PendingLaunch {
                id,
                target,
                enqueued_at: now,
                due_at,
            },
        );
        id
    }

    /// Remove a launch that has not fired yet.
    pub fn cancel(&mut self, id: LaunchId) -> Option<PendingLaunch> {
        let due_at = self.index.remove(&id)?;
        let launch = self.queue.remove(&(due_at, id));
        if launch.is_some() {
            debug!(launch_id = %id, "cancelled pending launch");
        }
        launch
    }

    /// Remove and return every entry with `due_at <= now`.
    pub fn take_due(&mut self, now: Instant) -> TickOutcome {
        let mut due = Vec::new();

        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let launch = entry.remove();
            self.index.remove(&launch.id);
            due.push(launch);
        }

        TickOutcome {
            due,
            remaining: self.queue.len(),
        }
    }

    /// Earliest due time among pending entries.
    pub fn next_due(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(due_at, _)| *due_at)
    }

    pub fn contains(&self, id: LaunchId) -> bool {
        self.index.contains_key(&id)
    }

    /// Pending entries in firing order.
    pub fn pending(&self) -> impl Iterator<Item = &PendingLaunch> {
        self.queue.values()
    }
}
