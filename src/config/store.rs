// src/config/store.rs

//! Persistence of the [`GroupRegistry`] in a JSON side-file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::model::{GroupRegistry, RegistryFile};
use crate::errors::{BuildrunError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::TargetName;

/// Loads and saves the launch-group registry for one workspace.
///
/// The backing path is decided by the caller (see
/// [`crate::config::loader::launch_config_path`]); the store never guesses.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(RealFileSystem))
    }

    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry.
    ///
    /// - Missing file: seed a `default` group with one entry per known target
    ///   and write it immediately, so later loads see the same thing.
    /// - Present but malformed file: error. The file is left untouched.
    pub fn load(&self, known_targets: &[TargetName]) -> Result<GroupRegistry> {
        if !self.fs.exists(&self.path) {
            let registry = GroupRegistry::seeded(known_targets.iter().cloned());
            info!(
                path = ?self.path,
                targets = registry.len(),
                "no launch config found; writing defaults"
            );
            self.save(&registry)?;
            return Ok(registry);
        }

        let contents = self.fs.read_to_string(&self.path)?;
        let raw: RegistryFile = serde_json::from_str(&contents).map_err(|e| {
            BuildrunError::ConfigError(format!(
                "malformed launch config {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let registry = GroupRegistry::try_from(raw)?;

        debug!(
            path = ?self.path,
            groups = registry.group_names().count(),
            targets = registry.len(),
            "loaded launch config"
        );
        Ok(registry)
    }

    /// Serialize the full registry and atomically replace the backing file.
    pub fn save(&self, registry: &GroupRegistry) -> Result<()> {
        let mut body = serde_json::to_string_pretty(&registry.to_file())?;
        body.push('\n');
        self.fs.write_atomic(&self.path, body.as_bytes())?;
        debug!(path = ?self.path, targets = registry.len(), "saved launch config");
        Ok(())
    }
}
