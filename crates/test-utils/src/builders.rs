#![allow(dead_code)]

use buildrun::config::{GroupRegistry, LaunchTarget};
use buildrun::types::{DEFAULT_GROUP, TARGET_DIR_PLACEHOLDER};

/// Builder for `LaunchTarget` to simplify test setup.
pub struct LaunchTargetBuilder {
    target: LaunchTarget,
}

impl LaunchTargetBuilder {
    pub fn new(target_name: &str) -> Self {
        Self {
            target: LaunchTarget {
                group: DEFAULT_GROUP.to_string(),
                target_name: target_name.to_string(),
                args: String::new(),
                working_dir: TARGET_DIR_PLACEHOLDER.to_string(),
                delay_seconds: 0,
            },
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.target.group = group.to_string();
        self
    }

    pub fn args(mut self, args: &str) -> Self {
        self.target.args = args.to_string();
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.target.working_dir = dir.to_string();
        self
    }

    pub fn delay(mut self, seconds: u32) -> Self {
        self.target.delay_seconds = seconds;
        self
    }

    pub fn build(self) -> LaunchTarget {
        self.target
    }
}

/// Builder for `GroupRegistry`.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: GroupRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `target` to `group` (overrides the target's own group field).
    pub fn with(mut self, group: &str, target: LaunchTargetBuilder) -> Self {
        self.registry.add(target.group(group).build());
        self
    }

    pub fn build(self) -> GroupRegistry {
        self.registry
    }
}
