// src/config/mod.rs

//! Configuration for buildrun.
//!
//! - [`model`]: launch targets and the group registry (JSON side-file shape).
//! - [`validate`]: semantic checks applied when a registry file is loaded.
//! - [`store`]: load/save of the registry with default seeding.
//! - [`manifest`] / [`loader`]: the TOML workspace manifest describing the
//!   build engine and the runnable targets.

pub mod loader;
pub mod manifest;
pub mod model;
pub mod store;
pub mod validate;

pub use loader::{launch_config_path, load_manifest, manifest_root_dir};
pub use manifest::{BuildSection, Manifest, TargetSection, WorkspaceSection};
pub use model::{GroupRegistry, LaunchTarget, RegistryFile};
pub use store::ConfigStore;
pub use validate::validate_registry_file;
