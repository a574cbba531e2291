use std::fmt;

/// Name of a launch group (the key of the registry map).
pub type GroupName = String;

/// Name of a buildable/runnable unit known to the host.
pub type TargetName = String;

/// Group used when a target is added without naming one.
pub const DEFAULT_GROUP: &str = "default";

/// Working-directory token that the host expands to the target's own output
/// directory.
pub const TARGET_DIR_PLACEHOLDER: &str = "${TargetDir}";

/// Lifecycle of the single supervised build process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildProcessState {
    #[default]
    Idle,
    Running,
    /// A kill has been requested but the runner has not observed the exit yet.
    Terminating,
}

impl BuildProcessState {
    pub fn is_running(self) -> bool {
        !matches!(self, BuildProcessState::Idle)
    }
}

impl fmt::Display for BuildProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildProcessState::Idle => "idle",
            BuildProcessState::Running => "running",
            BuildProcessState::Terminating => "terminating",
        };
        f.write_str(s)
    }
}
