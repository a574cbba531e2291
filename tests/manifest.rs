// tests/manifest.rs

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, tempdir};

use buildrun::config::{Manifest, launch_config_path, load_manifest, manifest_root_dir};
use buildrun::errors::BuildrunError;

#[test]
fn full_manifest_is_parsed() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[workspace]
name = "game"

[build]
program = "/opt/fastbuild/fbuild"
args = ["-dist", "-cache"]
clean_args = ["-clean", "-nounity"]

[target.server]
exe = "bin/server"
output_dir = "bin"

[target.client]
exe = "bin/client/client"
"#
    )
    .unwrap();

    let manifest = load_manifest(file.path()).unwrap();
    assert_eq!(manifest.workspace.name.as_deref(), Some("game"));
    assert_eq!(manifest.build.program, "/opt/fastbuild/fbuild");
    assert_eq!(manifest.build.args, vec!["-dist", "-cache"]);
    assert_eq!(manifest.build.clean_args, vec!["-clean", "-nounity"]);
    assert_eq!(manifest.target.len(), 2);
    assert_eq!(manifest.target["server"].output_dir.as_deref(), Some("bin"));
    assert!(manifest.target["client"].output_dir.is_none());
}

#[test]
fn empty_manifest_uses_build_defaults() {
    let file = NamedTempFile::new().unwrap();
    let manifest = load_manifest(file.path()).unwrap();
    assert_eq!(manifest.build.program, "fbuild");
    assert_eq!(manifest.build.args, vec!["-dist"]);
    assert_eq!(manifest.build.clean_args, vec!["-clean"]);
    assert!(manifest.target.is_empty());
}

#[test]
fn empty_exe_is_a_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[target.broken]\nexe = \"\"\n").unwrap();

    match load_manifest(file.path()) {
        Err(BuildrunError::ConfigError(msg)) => assert!(msg.contains("broken")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_build_program_is_a_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[build]\nprogram = \" \"\n").unwrap();
    assert!(matches!(
        load_manifest(file.path()),
        Err(BuildrunError::ConfigError(_))
    ));
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[target.x\nexe = 1").unwrap();
    assert!(matches!(
        load_manifest(file.path()),
        Err(BuildrunError::TomlError(_))
    ));
}

#[test]
fn missing_manifest_is_an_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_manifest(dir.path().join("nope.toml")),
        Err(BuildrunError::IoError(_))
    ));
}

#[test]
fn launch_config_lives_next_to_the_manifest() {
    let mut manifest = Manifest::default();
    manifest.workspace.name = Some("game".to_string());

    let path = launch_config_path(Path::new("/ws/Workspace.toml"), &manifest);
    assert_eq!(path, PathBuf::from("/ws/game.launch.json"));
}

#[test]
fn launch_config_falls_back_to_manifest_stem() {
    let manifest = Manifest::default();
    let path = launch_config_path(Path::new("/ws/Engine.toml"), &manifest);
    assert_eq!(path, PathBuf::from("/ws/Engine.launch.json"));
}

#[test]
fn bare_manifest_name_resolves_to_current_dir() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(manifest_root_dir(Path::new("Workspace.toml")), cwd);
    assert_eq!(manifest_root_dir(Path::new("sub/Workspace.toml")), PathBuf::from("sub"));
}
