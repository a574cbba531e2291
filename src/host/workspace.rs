// src/host/workspace.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Manifest;
use crate::exec::{BuildCommand, find_executable};
use crate::host::{HostEnvironment, ResolvedTarget, split_args};
use crate::sink::{LogSource, SharedSink};
use crate::types::TargetName;

/// Host backed by a TOML workspace manifest.
///
/// Launched instances and clean runs are spawned on tokio and reported to
/// the sink when they exit; nothing here waits on them.
#[derive(Debug)]
pub struct WorkspaceHost {
    root: PathBuf,
    manifest: Manifest,
    sink: SharedSink,
}

impl WorkspaceHost {
    pub fn new(root: impl Into<PathBuf>, manifest: Manifest, sink: SharedSink) -> Self {
        Self {
            root: root.into(),
            manifest,
            sink,
        }
    }

    fn spawn_and_report(&self, mut cmd: Command, label: String, source: LogSource) -> Result<()> {
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {label}"))?;
        debug!(label = %label, pid = ?child.id(), "spawned host process");

        let sink = self.sink.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    sink.info(source, format!("{label} exited"));
                }
                Ok(status) => {
                    sink.error(
                        source,
                        format!("{label} exited with status {}", status),
                    );
                }
                Err(e) => {
                    warn!(label = %label, error = %e, "waiting for host process failed");
                    sink.error(source, format!("{label}: {e}"));
                }
            }
        });
        Ok(())
    }
}

impl HostEnvironment for WorkspaceHost {
    fn known_targets(&self) -> Vec<TargetName> {
        self.manifest.target.keys().cloned().collect()
    }

    fn resolve(&self, name: &str) -> Option<ResolvedTarget> {
        let section = self.manifest.target.get(name)?;
        let exe = self.root.join(&section.exe);
        let output_dir = match &section.output_dir {
            Some(dir) => self.root.join(dir),
            None => exe
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
        };
        Some(ResolvedTarget {
            name: name.to_string(),
            exe,
            output_dir,
        })
    }

    fn start_instance(
        &self,
        target: &ResolvedTarget,
        args: &str,
        working_dir: &Path,
    ) -> Result<()> {
        if !target.exe.is_file() {
            bail!("executable {} does not exist (build first?)", target.exe.display());
        }
        if !working_dir.is_dir() {
            bail!("working directory {} does not exist", working_dir.display());
        }

        let argv = split_args(args);
        info!(
            target = %target.name,
            exe = ?target.exe,
            dir = ?working_dir,
            args = ?argv,
            "starting new instance"
        );

        let mut cmd = Command::new(&target.exe);
        cmd.args(&argv)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        self.spawn_and_report(cmd, format!("instance of '{}'", target.name), LogSource::Launch)
    }

    fn build_command(&self, target: Option<&str>) -> BuildCommand {
        match target {
            Some(name) => BuildCommand::build_target(&self.manifest.build, &self.root, name),
            None => BuildCommand::build_all(&self.manifest.build, &self.root),
        }
    }

    fn clean(&self) -> Result<()> {
        let command = BuildCommand::clean(&self.manifest.build, &self.root);
        let Some(program) = find_executable(&command.program, &command.working_dir) else {
            bail!("could not find build executable '{}'", command.program.display());
        };

        self.sink.info(LogSource::Clean, format!("cleaning: {command}"));
        let mut cmd = Command::new(program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        self.spawn_and_report(cmd, "clean".to_string(), LogSource::Clean)
    }
}
