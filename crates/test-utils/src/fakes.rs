#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use tokio::time::Instant;

use buildrun::config::LaunchTarget;
use buildrun::exec::{BuildCommand, LaunchBackend, LaunchError};
use buildrun::host::{HostEnvironment, ResolvedTarget};
use buildrun::sink::{LogLine, LogSink};
use buildrun::types::TargetName;

/// One call to `FakeHost::start_instance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedInstance {
    pub target: TargetName,
    pub args: String,
    pub working_dir: PathBuf,
    pub at: Instant,
}

/// In-memory host.
///
/// Targets live under `/fake/out/<name>`; starting one only records the call.
/// Targets can be forgotten mid-test to simulate a project being removed.
#[derive(Debug)]
pub struct FakeHost {
    targets: Mutex<BTreeMap<TargetName, ResolvedTarget>>,
    failing: Mutex<HashSet<TargetName>>,
    started: Mutex<Vec<StartedInstance>>,
    build: Mutex<BuildCommand>,
    cleans: AtomicUsize,
}

impl FakeHost {
    pub fn new(names: &[&str]) -> Arc<Self> {
        let targets = names
            .iter()
            .map(|n| (n.to_string(), Self::resolved(n)))
            .collect();
        Arc::new(Self {
            targets: Mutex::new(targets),
            failing: Mutex::new(HashSet::new()),
            started: Mutex::new(Vec::new()),
            build: Mutex::new(BuildCommand::new("true", "/")),
            cleans: AtomicUsize::new(0),
        })
    }

    fn resolved(name: &str) -> ResolvedTarget {
        let output_dir = PathBuf::from("/fake/out").join(name);
        ResolvedTarget {
            name: name.to_string(),
            exe: output_dir.join(format!("{name}.exe")),
            output_dir,
        }
    }

    /// The host no longer knows `name`.
    pub fn forget(&self, name: &str) {
        self.targets.lock().unwrap().remove(name);
    }

    /// Make every `start_instance` for `name` fail.
    pub fn fail_start(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn set_build_command(&self, command: BuildCommand) {
        *self.build.lock().unwrap() = command;
    }

    pub fn started(&self) -> Vec<StartedInstance> {
        self.started.lock().unwrap().clone()
    }

    pub fn started_names(&self) -> Vec<String> {
        self.started().into_iter().map(|s| s.target).collect()
    }

    pub fn clean_count(&self) -> usize {
        self.cleans.load(Ordering::SeqCst)
    }
}

impl HostEnvironment for FakeHost {
    fn known_targets(&self) -> Vec<TargetName> {
        self.targets.lock().unwrap().keys().cloned().collect()
    }

    fn resolve(&self, name: &str) -> Option<ResolvedTarget> {
        self.targets.lock().unwrap().get(name).cloned()
    }

    fn start_instance(
        &self,
        target: &ResolvedTarget,
        args: &str,
        working_dir: &Path,
    ) -> Result<()> {
        if self.failing.lock().unwrap().contains(&target.name) {
            bail!("{} refused to start", target.name);
        }
        self.started.lock().unwrap().push(StartedInstance {
            target: target.name.clone(),
            args: args.to_string(),
            working_dir: working_dir.to_path_buf(),
            at: Instant::now(),
        });
        Ok(())
    }

    fn build_command(&self, target: Option<&str>) -> BuildCommand {
        let command = self.build.lock().unwrap().clone();
        match target {
            Some(t) => command.arg(t),
            None => command,
        }
    }

    fn clean(&self) -> Result<()> {
        self.cleans.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Launch backend that records what fired and when.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    fired: Arc<Mutex<Vec<(LaunchTarget, Instant)>>>,
    failing: Arc<Mutex<HashSet<TargetName>>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn fired(&self) -> Vec<(LaunchTarget, Instant)> {
        self.fired.lock().unwrap().clone()
    }

    pub fn fired_names(&self) -> Vec<String> {
        self.fired()
            .into_iter()
            .map(|(t, _)| t.target_name)
            .collect()
    }
}

impl LaunchBackend for RecordingLauncher {
    fn launch(&mut self, target: &LaunchTarget) -> Result<(), LaunchError> {
        if self.failing.lock().unwrap().contains(&target.target_name) {
            return Err(LaunchError::StartFailed {
                target: target.target_name.clone(),
                message: "refused".to_string(),
            });
        }
        self.fired
            .lock()
            .unwrap()
            .push((target.clone(), Instant::now()));
        Ok(())
    }
}

/// Sink that keeps every line.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<LogLine>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.text).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.is_error)
            .map(|l| l.text)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.text.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn push(&self, line: LogLine) {
        self.lines.lock().unwrap().push(line);
    }
}
