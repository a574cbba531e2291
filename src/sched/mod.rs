// src/sched/mod.rs

//! Deferred launch scheduling.
//!
//! - [`scheduler`] holds the due-time ordered pending set.
//! - [`pending`] defines pending entries and the `LaunchId` handle.
//! - [`tick`] defines the result of one polling step.

pub mod pending;
pub mod scheduler;
pub mod tick;

pub use pending::{LaunchId, PendingLaunch};
pub use scheduler::LaunchScheduler;
pub use tick::TickOutcome;
