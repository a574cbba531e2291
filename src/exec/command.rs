// src/exec/command.rs

//! Build command description and executable lookup.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BuildSection;

/// A program invocation for the external build engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl BuildCommand {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full distributed build of the workspace rooted at `root`.
    pub fn build_all(build: &BuildSection, root: &Path) -> Self {
        Self::new(&build.program, root).args(build.args.iter().cloned())
    }

    /// Build a single target from `dir`.
    pub fn build_target(build: &BuildSection, dir: &Path, target: &str) -> Self {
        Self::new(&build.program, dir)
            .args(build.args.iter().cloned())
            .arg(target)
    }

    pub fn clean(build: &BuildSection, root: &Path) -> Self {
        Self::new(&build.program, root).args(build.clean_args.iter().cloned())
    }

    /// Locate the program, see [`find_executable`].
    pub fn resolve_program(&self) -> Option<PathBuf> {
        find_executable(&self.program, &self.working_dir)
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Find `program` the way a shell would.
///
/// - Absolute paths and paths with a directory component must name an
///   existing file (relative ones are taken from `cwd`).
/// - Bare names are searched in `PATH`.
pub fn find_executable(program: &Path, cwd: &Path) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }

    if program.is_absolute() || program.components().count() > 1 {
        let candidate = if program.is_absolute() {
            program.to_path_buf()
        } else {
            cwd.join(program)
        };
        return candidate.is_file().then_some(candidate);
    }

    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}
