#![allow(dead_code)]

use std::error::Error;

pub use buildrun_test_utils::builders::{LaunchTargetBuilder, RegistryBuilder};
pub use buildrun_test_utils::init_tracing;

pub type TestResult = Result<(), Box<dyn Error>>;

/// Shorthand for a target with a delay in `group`.
pub fn target(group: &str, name: &str, delay: u32) -> buildrun::config::LaunchTarget {
    LaunchTargetBuilder::new(name).group(group).delay(delay).build()
}
