// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::manifest::Manifest;
use crate::errors::{BuildrunError, Result};

/// Extension appended to the workspace name to form the launch side-file.
pub const LAUNCH_CONFIG_SUFFIX: &str = ".launch.json";

/// Read and validate a workspace manifest.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let manifest: Manifest = toml::from_str(&contents)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

fn validate_manifest(manifest: &Manifest) -> Result<()> {
    if manifest.build.program.trim().is_empty() {
        return Err(BuildrunError::ConfigError(
            "[build].program must not be empty".to_string(),
        ));
    }
    for (name, target) in manifest.target.iter() {
        if target.exe.trim().is_empty() {
            return Err(BuildrunError::ConfigError(format!(
                "target '{}' has an empty `exe`",
                name
            )));
        }
    }
    Ok(())
}

/// Directory the manifest lives in; relative paths resolve against it.
///
/// A bare filename like "Workspace.toml" resolves to the current directory.
pub fn manifest_root_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// One launch side-file per workspace: `<root>/<name>.launch.json`, where
/// `name` is `[workspace].name` or the manifest file stem.
pub fn launch_config_path(manifest_path: &Path, manifest: &Manifest) -> PathBuf {
    let name = manifest
        .workspace
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            manifest_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "workspace".to_string());

    manifest_root_dir(manifest_path).join(format!("{name}{LAUNCH_CONFIG_SUFFIX}"))
}
