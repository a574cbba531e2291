// tests/config_store.rs

mod common;
use crate::common::{LaunchTargetBuilder, RegistryBuilder, TestResult, target};

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::tempdir;

use buildrun::config::{ConfigStore, GroupRegistry};
use buildrun::errors::BuildrunError;
use buildrun::fs::mock::MockFileSystem;
use buildrun::fs::temp_sibling;

fn known(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn missing_file_is_seeded_and_written() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("game.launch.json");
    let store = ConfigStore::new(&path);

    let registry = store.load(&known(&["client", "server"]))?;
    assert_eq!(registry.group("default").map(|g| g.len()), Some(2));
    assert!(path.exists());

    // Second load reads the file rather than reseeding from a different set.
    let again = store.load(&known(&["other"]))?;
    assert_eq!(again, registry);
    Ok(())
}

#[test]
fn save_then_load_round_trips_groups_and_order() -> TestResult {
    let dir = tempdir()?;
    let store = ConfigStore::new(dir.path().join("w.launch.json"));

    let registry = RegistryBuilder::new()
        .with("servers", LaunchTargetBuilder::new("gate").args("-port 7000").delay(0))
        .with("servers", LaunchTargetBuilder::new("game").working_dir("/srv/game").delay(3))
        .with("tools", LaunchTargetBuilder::new("editor").args("\"my map\""))
        .build();
    store.save(&registry)?;

    let loaded = store.load(&[])?;
    assert_eq!(loaded, registry);
    Ok(())
}

#[test]
fn empty_group_survives_a_round_trip() -> TestResult {
    let dir = tempdir()?;
    let store = ConfigStore::new(dir.path().join("w.launch.json"));

    let mut registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A"))
        .build();
    assert!(registry.remove(&target("g", "A", 0)));
    store.save(&registry)?;

    let loaded = store.load(&[])?;
    assert_eq!(loaded.group("g").map(|g| g.len()), Some(0));
    Ok(())
}

#[test]
fn saved_file_uses_the_documented_json_shape() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("w.launch.json");
    let store = ConfigStore::new(&path);
    store.save(
        &RegistryBuilder::new()
            .with("g", LaunchTargetBuilder::new("A").args("-x").delay(2))
            .build(),
    )?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let entry = &json["groups"]["g"][0];
    assert_eq!(entry["targetName"], "A");
    assert_eq!(entry["args"], "-x");
    assert_eq!(entry["workingDir"], "${TargetDir}");
    assert_eq!(entry["delaySeconds"], 2);
    assert_eq!(entry["group"], "g");
    Ok(())
}

#[test]
fn legacy_field_names_are_accepted() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("old.launch.json");
    std::fs::write(
        &path,
        r#"{
  "allDebugInstance": {
    "servers": [
      { "projectName": "gate", "cmdParam": "-port 7000", "cmdDir": "${TargetDir}", "delay": 4 },
      { "projectName": "game", "cmdParam": null, "cmdDir": null }
    ]
  }
}"#,
    )?;

    let registry = ConfigStore::new(&path).load(&[])?;
    let servers = registry.group("servers").unwrap();
    assert_eq!(servers[0].target_name, "gate");
    assert_eq!(servers[0].args, "-port 7000");
    assert_eq!(servers[0].delay_seconds, 4);
    assert_eq!(servers[0].group, "servers");
    assert_eq!(servers[1].args, "");
    assert_eq!(servers[1].working_dir, "");
    assert_eq!(servers[1].delay_seconds, 0);
    Ok(())
}

#[test]
fn malformed_file_is_a_config_error_and_left_alone() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("bad.launch.json");
    std::fs::write(&path, "{ not json")?;

    match ConfigStore::new(&path).load(&known(&["A"])) {
        Err(BuildrunError::ConfigError(msg)) => assert!(msg.contains("malformed")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

#[test]
fn atomic_save_leaves_no_temp_file() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("w.launch.json");
    let store = ConfigStore::new(&path);

    store.save(&GroupRegistry::seeded(["A"]))?;
    store.save(&GroupRegistry::seeded(["A", "B"]))?;

    assert!(path.exists());
    assert!(!temp_sibling(&path).exists());
    assert_eq!(store.load(&[])?.len(), 2);
    Ok(())
}

#[test]
fn temp_sibling_appends_tmp_suffix() {
    assert_eq!(
        temp_sibling(&PathBuf::from("/a/b/w.launch.json")),
        PathBuf::from("/a/b/w.launch.json.tmp")
    );
}

#[test]
fn mock_fs_failed_write_keeps_previous_contents() -> TestResult {
    let fs = MockFileSystem::new();
    let path = PathBuf::from("/ws/w.launch.json");
    let store = ConfigStore::with_fs(&path, Arc::new(fs.clone()));

    let first = GroupRegistry::seeded(["A"]);
    store.save(&first)?;
    let before = fs.contents(&path);

    fs.fail_writes(true);
    assert!(store.save(&GroupRegistry::seeded(["A", "B"])).is_err());
    assert_eq!(fs.contents(&path), before);
    assert_eq!(fs.write_count(), 1);

    fs.fail_writes(false);
    assert_eq!(store.load(&[])?, first);
    Ok(())
}

#[test]
fn seeding_fails_when_the_file_cannot_be_written() {
    let fs = MockFileSystem::new();
    fs.fail_writes(true);
    let store = ConfigStore::with_fs("/ws/w.launch.json", Arc::new(fs));
    assert!(store.load(&known(&["A"])).is_err());
}
