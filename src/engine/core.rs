// src/engine/core.rs

//! Pure orchestrator state machine.
//!
//! `OrchestratorCore` owns the group registry and the deferred launch
//! scheduler. It has no channels, no processes and no file IO; time is
//! passed in. The async shell (`engine::runtime::Runtime`) persists the
//! registry after each mutation and performs the launches this core hands
//! back from [`OrchestratorCore::tick`].

use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{GroupRegistry, LaunchTarget};
use crate::errors::{BuildrunError, Result};
use crate::sched::{LaunchId, LaunchScheduler, PendingLaunch, TickOutcome};

#[derive(Debug, Default)]
pub struct OrchestratorCore {
    registry: GroupRegistry,
    scheduler: LaunchScheduler,
}

impl OrchestratorCore {
    pub fn new(registry: GroupRegistry) -> Self {
        Self {
            registry,
            scheduler: LaunchScheduler::new(),
        }
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &LaunchScheduler {
        &self.scheduler
    }

    /// True when nothing is waiting to fire.
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty()
    }

    pub fn run_one(&mut self, target: LaunchTarget, now: Instant) -> LaunchId {
        self.scheduler.enqueue(target, now)
    }

    pub fn run_entry(&mut self, group: &str, index: usize, now: Instant) -> Result<LaunchId> {
        let target = self
            .registry
            .get(group, index)
            .cloned()
            .ok_or_else(|| BuildrunError::TargetNotFound(format!("{group}[{index}]")))?;
        Ok(self.scheduler.enqueue(target, now))
    }

    /// Enqueue every entry of `group`, each with its own delay.
    pub fn run_group(&mut self, group: &str, now: Instant) -> Result<Vec<LaunchId>> {
        let targets = self
            .registry
            .group(group)
            .ok_or_else(|| BuildrunError::GroupNotFound(group.to_string()))?
            .to_vec();

        info!(group = %group, count = targets.len(), "running group");
        Ok(targets
            .into_iter()
            .map(|t| self.scheduler.enqueue(t, now))
            .collect())
    }

    pub fn run_all(&mut self, now: Instant) -> Vec<LaunchId> {
        let targets: Vec<LaunchTarget> = self.registry.iter_targets().cloned().collect();
        info!(count = targets.len(), "running all groups");
        targets
            .into_iter()
            .map(|t| self.scheduler.enqueue(t, now))
            .collect()
    }

    pub fn cancel(&mut self, id: LaunchId) -> Option<PendingLaunch> {
        self.scheduler.cancel(id)
    }

    /// Remove every launch due at `now`. The caller fires them.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.scheduler.take_due(now);
        if !outcome.is_empty() {
            debug!(
                due = outcome.due.len(),
                remaining = outcome.remaining,
                "scheduler tick"
            );
        }
        outcome
    }

    pub fn add_target(&mut self, target: LaunchTarget) {
        debug!(group = %target.group, target = %target.target_name, "adding launch target");
        self.registry.add(target);
    }

    pub fn remove_target(&mut self, target: &LaunchTarget) -> Result<()> {
        if self.registry.remove(target) {
            Ok(())
        } else {
            Err(BuildrunError::TargetNotFound(format!(
                "{} in group {}",
                target.target_name, target.group
            )))
        }
    }

    pub fn remove_entry(&mut self, group: &str, index: usize) -> Result<LaunchTarget> {
        self.registry
            .remove_at(group, index)
            .ok_or_else(|| BuildrunError::TargetNotFound(format!("{group}[{index}]")))
    }

    pub fn replace_target(&mut self, old: &LaunchTarget, new: LaunchTarget) -> Result<()> {
        if self.registry.replace(old, new) {
            Ok(())
        } else {
            Err(BuildrunError::TargetNotFound(format!(
                "{} in group {}",
                old.target_name, old.group
            )))
        }
    }

    /// Swap the registry wholesale; used to undo a mutation whose save failed.
    pub fn restore_registry(&mut self, registry: GroupRegistry) {
        self.registry = registry;
    }
}
