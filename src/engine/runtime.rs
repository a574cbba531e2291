use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, GroupRegistry};
use crate::errors::{BuildrunError, Result};
use crate::exec::{BuildSupervisor, LaunchBackend, StartOutcome, SuperviseError};
use crate::host::HostEnvironment;
use crate::sink::{LogSource, SharedSink};

use super::core::OrchestratorCore;
use super::{Action, ActionReport, RuntimeEvent, RuntimeOptions, StatusSnapshot};

/// Single-writer actor around [`OrchestratorCore`].
///
/// All registry and scheduler mutations happen on this loop, so UI actions
/// and the tick never interleave. It also owns the build supervisor, the
/// config store and the launch backend.
pub struct Runtime<L: LaunchBackend> {
    core: OrchestratorCore,
    store: ConfigStore,
    host: Arc<dyn HostEnvironment>,
    launcher: L,
    supervisor: BuildSupervisor,
    sink: SharedSink,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    options: RuntimeOptions,
}

impl<L: LaunchBackend> fmt::Debug for Runtime<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("store", &self.store)
            .field("supervisor", &self.supervisor)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<L: LaunchBackend> Runtime<L> {
    pub fn new(
        core: OrchestratorCore,
        store: ConfigStore,
        host: Arc<dyn HostEnvironment>,
        launcher: L,
        sink: SharedSink,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        options: RuntimeOptions,
    ) -> Self {
        let supervisor = BuildSupervisor::new(sink.clone());
        Self {
            core,
            store,
            host,
            launcher,
            supervisor,
            sink,
            event_rx,
            options,
        }
    }

    /// Main loop.
    ///
    /// - Handles queued actions before each tick, so actions sent before
    ///   `run` starts are seen by the very first tick.
    /// - Ticks at `options.tick_interval`, firing every due launch.
    /// - Stops on shutdown, or (with `exit_when_idle`) once nothing is
    ///   pending and no build runs.
    /// - When every handle is dropped it stops at once, unless
    ///   `exit_when_idle` is set; then it keeps ticking until idle.
    pub async fn run(mut self) -> Result<()> {
        info!(
            tick_ms = self.options.tick_interval.as_millis() as u64,
            groups = self.core.registry().group_names().count(),
            "buildrun runtime started"
        );

        let mut ticker = interval(self.options.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut rx_closed = false;

        loop {
            tokio::select! {
                biased;

                event = self.event_rx.recv(), if !rx_closed => {
                    match event {
                        Some(RuntimeEvent::Action { action, reply }) => {
                            debug!(?action, "runtime received action");
                            let result = self.handle_action(action);
                            if let Some(reply) = reply {
                                let _ = reply.send(result);
                            }
                        }
                        Some(RuntimeEvent::ShutdownRequested) => {
                            info!("shutdown requested; stopping runtime");
                            break;
                        }
                        None => {
                            rx_closed = true;
                            if !self.options.exit_when_idle || self.is_idle() {
                                info!("runtime event channel closed; exiting");
                                break;
                            }
                            info!(
                                pending = self.core.scheduler().len(),
                                "runtime event channel closed; draining pending launches"
                            );
                        }
                    }
                }

                _ = ticker.tick() => {
                    self.tick(Instant::now());
                    if self.options.exit_when_idle && self.is_idle() {
                        info!("nothing pending and no build running; stopping runtime");
                        break;
                    }
                }
            }
        }

        self.shutdown();
        info!("runtime exiting");
        Ok(())
    }

    fn is_idle(&self) -> bool {
        self.core.is_idle() && !self.supervisor.is_running()
    }

    /// Fire every launch due at `now`.
    ///
    /// A failed launch is not retried and does not affect the others; the
    /// failure goes to both the log and the sink.
    fn tick(&mut self, now: Instant) {
        let outcome = self.core.tick(now);
        for launch in outcome.due {
            let target = &launch.target;
            match self.launcher.launch(target) {
                Ok(()) => {
                    info!(
                        launch_id = %launch.id,
                        target = %target.target_name,
                        group = %target.group,
                        "launched"
                    );
                    self.sink.info(
                        LogSource::Launch,
                        format!("started '{}' (group {})", target.target_name, target.group),
                    );
                }
                Err(e) => {
                    warn!(
                        launch_id = %launch.id,
                        target = %target.target_name,
                        group = %target.group,
                        error = %e,
                        "launch failed; skipping"
                    );
                    self.sink.error(
                        LogSource::Launch,
                        format!("launch {} skipped: {e}", launch.id),
                    );
                }
            }
        }
    }

    fn handle_action(&mut self, action: Action) -> Result<ActionReport> {
        let now = Instant::now();
        match action {
            Action::ToggleBuild => {
                if self.supervisor.is_running() {
                    self.supervisor.stop();
                    Ok(ActionReport::BuildStopping)
                } else {
                    self.start_build(None)
                }
            }
            Action::StartBuild { target } => self.start_build(target.as_deref()),
            Action::StopBuild => {
                if self.supervisor.stop() {
                    Ok(ActionReport::BuildStopping)
                } else {
                    Ok(ActionReport::BuildIdle)
                }
            }
            Action::Clean => {
                self.host.clean().map_err(|e| {
                    self.sink.error(LogSource::Clean, format!("clean failed: {e:#}"));
                    BuildrunError::Other(e)
                })?;
                Ok(ActionReport::Cleaning)
            }
            Action::RunOne(target) => {
                let id = self.core.run_one(target, now);
                Ok(ActionReport::Enqueued(vec![id]))
            }
            Action::RunEntry { group, index } => {
                let id = self.core.run_entry(&group, index, now)?;
                Ok(ActionReport::Enqueued(vec![id]))
            }
            Action::RunGroup(group) => {
                let ids = self.core.run_group(&group, now)?;
                Ok(ActionReport::Enqueued(ids))
            }
            Action::RunAll => Ok(ActionReport::Enqueued(self.core.run_all(now))),
            Action::AddTarget(target) => {
                self.mutate(|core| {
                    core.add_target(target);
                    Ok(())
                })?;
                Ok(ActionReport::Saved)
            }
            Action::RemoveTarget(target) => {
                self.mutate(|core| core.remove_target(&target))?;
                Ok(ActionReport::Removed(target))
            }
            Action::RemoveEntry { group, index } => {
                let removed = self.mutate(|core| core.remove_entry(&group, index))?;
                Ok(ActionReport::Removed(removed))
            }
            Action::ReplaceTarget { old, new } => {
                self.mutate(|core| core.replace_target(&old, new))?;
                Ok(ActionReport::Saved)
            }
            Action::CancelLaunch(id) => Ok(ActionReport::Cancelled(self.core.cancel(id))),
            Action::Status => Ok(ActionReport::Status(self.status())),
        }
    }

    fn start_build(&mut self, target: Option<&str>) -> Result<ActionReport> {
        let command = self.host.build_command(target);
        match self.supervisor.start(command) {
            Ok(StartOutcome::Started) => Ok(ActionReport::BuildStarted),
            Ok(StartOutcome::NotStarted(reason)) => Ok(ActionReport::BuildNotStarted(reason)),
            Err(SuperviseError::AlreadyRunning(running)) => {
                self.sink
                    .error(LogSource::Build, format!("build already running: {running}"));
                Err(BuildrunError::AlreadyRunning)
            }
        }
    }

    /// Apply a registry mutation and save it. If the save fails the
    /// registry is rolled back, so memory and disk never disagree.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut OrchestratorCore) -> Result<T>) -> Result<T> {
        let before: GroupRegistry = self.core.registry().clone();
        let value = f(&mut self.core)?;
        if let Err(e) = self.store.save(self.core.registry()) {
            warn!(
                path = ?self.store.path(),
                error = %e,
                "saving launch config failed; rolling back"
            );
            self.sink.error(
                LogSource::Orchestrator,
                format!("could not save {}: {e}", self.store.path().display()),
            );
            self.core.restore_registry(before);
            return Err(e);
        }
        Ok(value)
    }

    fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            build: self.supervisor.state(),
            build_command: self.supervisor.current_command().map(str::to_string),
            pending: self.core.scheduler().pending().cloned().collect(),
            registry: self.core.registry().clone(),
        }
    }

    fn shutdown(&mut self) {
        if self.supervisor.stop() {
            info!("stopped running build on shutdown");
        }
        let dropped = self.core.scheduler().len();
        if dropped > 0 {
            info!(dropped, "discarding pending launches on shutdown");
            self.sink.info(
                LogSource::Orchestrator,
                format!("{dropped} pending launch(es) discarded"),
            );
        }
    }
}
