// src/engine/mod.rs

//! Orchestration engine for buildrun.
//!
//! This module ties together:
//! - the launch-group registry and its persistence
//! - the deferred launch scheduler
//! - the build supervisor
//! - the runtime loop that reacts to:
//!   - user actions (build, run, add/remove, cancel)
//!   - the periodic scheduler tick
//!   - shutdown signals
//!
//! The pure state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`], and [`handle`] is the client side used to
//! send actions into it.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::{GroupRegistry, LaunchTarget};
use crate::errors::Result;
use crate::sched::{LaunchId, PendingLaunch};
use crate::types::{BuildProcessState, GroupName, TargetName};

pub mod core;
pub mod handle;
pub mod runtime;

pub use core::OrchestratorCore;
pub use handle::{OrchestratorHandle, PendingReply};
pub use runtime::Runtime;

/// Default scheduler tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// User-facing actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Stop the build if one is running, otherwise start a full build.
    ToggleBuild,
    /// Start a build of everything (`None`) or of one target. Refused while
    /// a build is running.
    StartBuild { target: Option<TargetName> },
    StopBuild,
    Clean,
    RunOne(LaunchTarget),
    /// Run the entry at `index` of `group`.
    RunEntry { group: GroupName, index: usize },
    RunGroup(GroupName),
    RunAll,
    AddTarget(LaunchTarget),
    RemoveTarget(LaunchTarget),
    RemoveEntry { group: GroupName, index: usize },
    /// Delete `old` and add `new`.
    ReplaceTarget { old: LaunchTarget, new: LaunchTarget },
    CancelLaunch(LaunchId),
    Status,
}

/// Successful result of an [`Action`].
#[derive(Debug, Clone)]
pub enum ActionReport {
    BuildStarted,
    /// Missing executable or spawn failure; already reported to the sink.
    BuildNotStarted(String),
    BuildStopping,
    /// Stop requested with no live build.
    BuildIdle,
    Cleaning,
    Enqueued(Vec<LaunchId>),
    /// Registry changed and was saved.
    Saved,
    Removed(LaunchTarget),
    /// `None` when the launch had already fired or never existed.
    Cancelled(Option<PendingLaunch>),
    Status(StatusSnapshot),
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub build: BuildProcessState,
    pub build_command: Option<String>,
    /// Pending launches in firing order.
    pub pending: Vec<PendingLaunch>,
    pub registry: GroupRegistry,
}

/// Runtime options.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub tick_interval: Duration,
    /// If true, exit once no launch is pending and no build is running
    /// (used by one-shot CLI commands).
    pub exit_when_idle: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            exit_when_idle: false,
        }
    }
}

/// Events flowing into the runtime.
#[derive(Debug)]
pub enum RuntimeEvent {
    Action {
        action: Action,
        /// Dropped replies are fine; the action still runs.
        reply: Option<oneshot::Sender<Result<ActionReport>>>,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}
