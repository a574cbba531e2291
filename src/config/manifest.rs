// src/config/manifest.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Workspace manifest as read from TOML.
///
/// ```toml
/// [workspace]
/// name = "game"
///
/// [build]
/// program = "fbuild"
/// args = ["-dist"]
/// clean_args = ["-clean"]
///
/// [target.server]
/// exe = "bin/server"
/// output_dir = "bin"
/// ```
///
/// Every section is optional. Paths are relative to the manifest directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub workspace: WorkspaceSection,

    #[serde(default)]
    pub build: BuildSection,

    /// Runnable targets keyed by name.
    #[serde(default)]
    pub target: BTreeMap<String, TargetSection>,
}

/// `[workspace]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceSection {
    /// Used to name the launch side-file. Falls back to the manifest file stem.
    #[serde(default)]
    pub name: Option<String>,
}

/// `[build]` section: how to invoke the external build engine.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_build_program")]
    pub program: String,

    /// Arguments for a full distributed build.
    #[serde(default = "default_build_args")]
    pub args: Vec<String>,

    #[serde(default = "default_clean_args")]
    pub clean_args: Vec<String>,
}

fn default_build_program() -> String {
    "fbuild".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["-dist".to_string()]
}

fn default_clean_args() -> Vec<String> {
    vec!["-clean".to_string()]
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            program: default_build_program(),
            args: default_build_args(),
            clean_args: default_clean_args(),
        }
    }
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSection {
    /// Executable started for a launch.
    pub exe: String,

    /// Directory substituted for `${TargetDir}`. Defaults to the directory
    /// containing `exe`.
    #[serde(default)]
    pub output_dir: Option<String>,
}
