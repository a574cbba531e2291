// src/config/validate.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::model::{GroupRegistry, RegistryFile};
use crate::errors::{BuildrunError, Result};

impl TryFrom<RegistryFile> for GroupRegistry {
    type Error = BuildrunError;

    fn try_from(raw: RegistryFile) -> std::result::Result<Self, Self::Error> {
        validate_registry_file(&raw)?;

        // The map key is authoritative for group membership.
        let mut groups = BTreeMap::new();
        for (name, mut targets) in raw.groups {
            for target in targets.iter_mut() {
                if target.group != name {
                    debug!(
                        group = %name,
                        recorded = %target.group,
                        target = %target.target_name,
                        "entry group differs from its key; using key"
                    );
                    target.group = name.clone();
                }
            }
            groups.insert(name, targets);
        }

        Ok(GroupRegistry::from_groups_unchecked(groups))
    }
}

pub fn validate_registry_file(file: &RegistryFile) -> Result<()> {
    for (name, targets) in file.groups.iter() {
        if name.trim().is_empty() {
            return Err(BuildrunError::ConfigError(
                "group names must not be empty".to_string(),
            ));
        }
        for (idx, target) in targets.iter().enumerate() {
            if target.target_name.trim().is_empty() {
                return Err(BuildrunError::ConfigError(format!(
                    "group '{}' entry {} has an empty targetName",
                    name, idx
                )));
            }
        }
    }
    Ok(())
}
