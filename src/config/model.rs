// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_GROUP, GroupName, TARGET_DIR_PLACEHOLDER, TargetName};

/// One runnable entry: which target to start, with what arguments, from
/// which directory, and how long after the request.
///
/// JSON shape (inside a group array):
///
/// ```json
/// { "group": "servers", "targetName": "gate", "args": "-port 7000",
///   "workingDir": "${TargetDir}", "delaySeconds": 2 }
/// ```
///
/// Field aliases accept files written by the older tool
/// (`projectName`, `cmdParam`, `cmdDir`, `delay`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTarget {
    /// Redundant with the registry key; the key wins on load.
    #[serde(default = "default_group")]
    pub group: GroupName,

    #[serde(alias = "projectName")]
    pub target_name: TargetName,

    #[serde(default, alias = "cmdParam", deserialize_with = "null_as_empty")]
    pub args: String,

    #[serde(default, alias = "cmdDir", deserialize_with = "null_as_empty")]
    pub working_dir: String,

    #[serde(default, alias = "delay")]
    pub delay_seconds: u32,
}

fn default_group() -> GroupName {
    DEFAULT_GROUP.to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl LaunchTarget {
    /// Entry in the default group with no args, the output-dir placeholder
    /// and zero delay. This is what a fresh registry is seeded with.
    pub fn with_defaults(target_name: impl Into<TargetName>) -> Self {
        Self {
            group: default_group(),
            target_name: target_name.into(),
            args: String::new(),
            working_dir: TARGET_DIR_PLACEHOLDER.to_string(),
            delay_seconds: 0,
        }
    }
}

/// Serialized form of the whole registry: a single field mapping group name
/// to its ordered entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default, alias = "allDebugInstance")]
    pub groups: BTreeMap<GroupName, Vec<LaunchTarget>>,
}

/// In-memory mapping from group name to its ordered launch targets.
///
/// Every entry's `group` field equals the key of the list holding it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRegistry {
    groups: BTreeMap<GroupName, Vec<LaunchTarget>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry containing a single `default` group, one entry per
    /// known target.
    pub fn seeded<I, S>(known_targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetName>,
    {
        let mut registry = Self::new();
        let defaults: Vec<LaunchTarget> = known_targets
            .into_iter()
            .map(LaunchTarget::with_defaults)
            .collect();
        if !defaults.is_empty() {
            registry.groups.insert(default_group(), defaults);
        }
        registry
    }

    pub(crate) fn from_groups_unchecked(groups: BTreeMap<GroupName, Vec<LaunchTarget>>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of launch targets across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[LaunchTarget])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn group(&self, name: &str) -> Option<&[LaunchTarget]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn get(&self, group: &str, index: usize) -> Option<&LaunchTarget> {
        self.groups.get(group)?.get(index)
    }

    pub fn iter_targets(&self) -> impl Iterator<Item = &LaunchTarget> {
        self.groups.values().flatten()
    }

    /// Append a target to its group, creating the group if needed. An empty
    /// group name is treated as `default`.
    pub fn add(&mut self, mut target: LaunchTarget) {
        if target.group.trim().is_empty() {
            target.group = default_group();
        }
        self.groups
            .entry(target.group.clone())
            .or_default()
            .push(target);
    }

    /// Remove the first entry equal to `target` from its group.
    ///
    /// The group itself is kept even when it becomes empty.
    pub fn remove(&mut self, target: &LaunchTarget) -> bool {
        let Some(list) = self.groups.get_mut(&target.group) else {
            return false;
        };
        match list.iter().position(|t| t == target) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn remove_at(&mut self, group: &str, index: usize) -> Option<LaunchTarget> {
        let list = self.groups.get_mut(group)?;
        if index < list.len() {
            Some(list.remove(index))
        } else {
            None
        }
    }

    /// Delete `old` and append `new` (which may live in a different group).
    ///
    /// Returns `false` and leaves the registry untouched if `old` is absent.
    pub fn replace(&mut self, old: &LaunchTarget, new: LaunchTarget) -> bool {
        if !self.remove(old) {
            return false;
        }
        self.add(new);
        true
    }

    pub fn to_file(&self) -> RegistryFile {
        RegistryFile {
            groups: self.groups.clone(),
        }
    }
}
