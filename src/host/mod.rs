// src/host/mod.rs

//! The host environment: whatever knows which targets exist, where they
//! live, and how to start them.
//!
//! The orchestrator only talks to [`HostEnvironment`]. [`WorkspaceHost`]
//! is the manifest-backed implementation used by the binary; tests plug in
//! their own.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::exec::BuildCommand;
use crate::types::{TARGET_DIR_PLACEHOLDER, TargetName};

pub mod args;
pub mod workspace;

pub use args::split_args;
pub use workspace::WorkspaceHost;

/// A target the host knows how to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub name: TargetName,
    pub exe: PathBuf,
    /// What `${TargetDir}` expands to.
    pub output_dir: PathBuf,
}

impl ResolvedTarget {
    /// Expand a configured working directory.
    ///
    /// Empty means "host default", which is the output directory.
    pub fn expand_working_dir(&self, raw: &str) -> PathBuf {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.output_dir.clone();
        }
        if raw.contains(TARGET_DIR_PLACEHOLDER) {
            let output_dir = self.output_dir.to_string_lossy();
            return PathBuf::from(raw.replace(TARGET_DIR_PLACEHOLDER, &output_dir));
        }
        PathBuf::from(raw)
    }
}

pub trait HostEnvironment: Send + Sync + Debug {
    /// Names of every target that can currently be launched.
    fn known_targets(&self) -> Vec<TargetName>;

    fn resolve(&self, name: &str) -> Option<ResolvedTarget>;

    /// Start a new instance of `target`. Must not block on the instance.
    fn start_instance(&self, target: &ResolvedTarget, args: &str, working_dir: &Path) -> Result<()>;

    /// Command that builds everything, or only `target`.
    fn build_command(&self, target: Option<&str>) -> BuildCommand;

    /// Clean build outputs. Must not block on the clean itself.
    fn clean(&self) -> Result<()>;
}
