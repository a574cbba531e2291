// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] owns the single external build process.
//! - [`build_runner`] streams a running build's output and handles kills.
//! - [`command`] describes build invocations and finds executables.
//! - [`backend`] provides the `LaunchBackend` trait used to fire due
//!   launches, and the host-backed `HostLauncher`.

pub mod backend;
pub mod build_runner;
pub mod command;
pub mod supervisor;

pub use backend::{HostLauncher, LaunchBackend, LaunchError};
pub use build_runner::BuildExit;
pub use command::{BuildCommand, find_executable};
pub use supervisor::{BuildSupervisor, StartOutcome, SuperviseError};
