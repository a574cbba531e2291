// src/exec/supervisor.rs

//! Owner of the single external build process.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::build_runner::{BuildExit, run_build};
use crate::exec::command::BuildCommand;
use crate::sink::{LogSource, SharedSink};
use crate::types::BuildProcessState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuperviseError {
    /// A build is live; a second one is refused, never queued.
    #[error("a build process is already running: {0}")]
    AlreadyRunning(String),
}

/// Result of a `start` call that was not refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The executable was missing or spawning failed. Already reported to
    /// the sink; the supervisor stays idle.
    NotStarted(String),
}

/// Handle for the live process.
///
/// - `cancel` asks the runner to kill the child; it is taken on `stop()`,
///   which is how `Terminating` is told apart from `Running`.
/// - `handle` is the tokio task running [`run_build`].
#[derive(Debug)]
struct ActiveBuild {
    command_line: String,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<BuildExit>,
}

/// Starts, streams and stops at most one build process at a time.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct BuildSupervisor {
    sink: SharedSink,
    active: Option<ActiveBuild>,
}

impl BuildSupervisor {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink, active: None }
    }

    pub fn state(&self) -> BuildProcessState {
        match &self.active {
            None => BuildProcessState::Idle,
            Some(active) if active.handle.is_finished() => BuildProcessState::Idle,
            Some(active) if active.cancel.is_none() => BuildProcessState::Terminating,
            Some(_) => BuildProcessState::Running,
        }
    }

    /// Non-blocking liveness check.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Command line of the live build, if any.
    pub fn current_command(&self) -> Option<&str> {
        match &self.active {
            Some(active) if !active.handle.is_finished() => Some(active.command_line.as_str()),
            _ => None,
        }
    }

    /// Spawn `command` with its output streamed to the sink.
    pub fn start(&mut self, command: BuildCommand) -> Result<StartOutcome, SuperviseError> {
        if let Some(active) = &self.active {
            if !active.handle.is_finished() {
                warn!(
                    running = %active.command_line,
                    requested = %command,
                    "build requested while one is running; rejecting"
                );
                return Err(SuperviseError::AlreadyRunning(active.command_line.clone()));
            }
        }
        self.active = None;

        let command_line = command.to_string();

        let Some(program) = command.resolve_program() else {
            let msg = format!(
                "could not find build executable '{}'",
                command.program.display()
            );
            warn!(program = ?command.program, "build executable not found");
            self.sink.error(LogSource::Build, msg.clone());
            return Ok(StartOutcome::NotStarted(msg));
        };

        self.sink.info(
            LogSource::Build,
            format!("launching build: {command_line}"),
        );

        let mut cmd = Command::new(&program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let msg = format!("failed to launch build '{command_line}': {e}");
                warn!(cmd = %command_line, error = %e, "spawning build process failed");
                self.sink.error(LogSource::Build, msg.clone());
                return Ok(StartOutcome::NotStarted(msg));
            }
        };

        info!(cmd = %command_line, pid = ?child.id(), "build process started");

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(run_build(
            child,
            command_line.clone(),
            self.sink.clone(),
            cancel_rx,
        ));

        self.active = Some(ActiveBuild {
            command_line,
            cancel: Some(cancel_tx),
            handle,
        });
        Ok(StartOutcome::Started)
    }

    /// Forcibly terminate the live build. No-op when idle.
    ///
    /// Returns `true` if a kill was requested by this call.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            debug!("stop requested with no build process; ignoring");
            return false;
        };
        if active.handle.is_finished() {
            debug!("stop requested after build exited; ignoring");
            return false;
        }
        match active.cancel.take() {
            Some(cancel) => {
                if cancel.send(()).is_err() {
                    debug!(cmd = %active.command_line, "build finished while stopping");
                    return false;
                }
                info!(cmd = %active.command_line, "stopping build process");
                true
            }
            None => {
                debug!(cmd = %active.command_line, "build already terminating");
                false
            }
        }
    }

    /// Wait for the current build to end and return how it ended.
    ///
    /// Returns `None` if no build was started since the last `wait`.
    pub async fn wait(&mut self) -> Option<BuildExit> {
        let active = self.active.take()?;
        match active.handle.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                warn!(cmd = %active.command_line, error = %e, "build runner task failed");
                Some(BuildExit::Lost)
            }
        }
    }
}
