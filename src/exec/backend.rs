// src/exec/backend.rs

//! Pluggable launch backend.
//!
//! The runtime fires due launches through a `LaunchBackend` instead of
//! talking to the host directly. Production uses [`HostLauncher`]; tests
//! provide a backend that records what fired.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::LaunchTarget;
use crate::host::HostEnvironment;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("target '{0}' not found")]
    TargetNotFound(String),

    #[error("failed to start '{target}': {message}")]
    StartFailed { target: String, message: String },
}

/// The launch callback invoked for every due entry.
///
/// Implementations must return quickly: a slow launch delays every other
/// entry due in the same tick.
pub trait LaunchBackend: Send {
    fn launch(&mut self, target: &LaunchTarget) -> Result<(), LaunchError>;
}

/// Launches through a [`HostEnvironment`]: resolve the target, expand the
/// working directory, start a new instance.
#[derive(Debug, Clone)]
pub struct HostLauncher {
    host: Arc<dyn HostEnvironment>,
}

impl HostLauncher {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }
}

impl LaunchBackend for HostLauncher {
    fn launch(&mut self, target: &LaunchTarget) -> Result<(), LaunchError> {
        let resolved = self
            .host
            .resolve(&target.target_name)
            .ok_or_else(|| LaunchError::TargetNotFound(target.target_name.clone()))?;

        let working_dir = resolved.expand_working_dir(&target.working_dir);
        debug!(
            target = %resolved.name,
            dir = ?working_dir,
            "launching resolved target"
        );

        self.host
            .start_instance(&resolved, &target.args, &working_dir)
            .map_err(|e| LaunchError::StartFailed {
                target: target.target_name.clone(),
                message: format!("{e:#}"),
            })
    }
}
