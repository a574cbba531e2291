// tests/runtime_scenarios.rs

mod common;
use crate::common::{LaunchTargetBuilder, RegistryBuilder, TestResult, init_tracing, target};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use buildrun::config::{ConfigStore, GroupRegistry};
use buildrun::engine::{
    Action, ActionReport, OrchestratorCore, OrchestratorHandle, Runtime, RuntimeOptions,
};
use buildrun::errors::{BuildrunError, Result};
use buildrun::exec::{HostLauncher, LaunchBackend};
use buildrun::fs::mock::MockFileSystem;
use buildrun::types::BuildProcessState;
use buildrun_test_utils::fakes::{FakeHost, RecordingLauncher, RecordingSink};
use buildrun_test_utils::with_timeout;

const CONFIG: &str = "/ws/game.launch.json";

struct Harness<L: LaunchBackend> {
    runtime: Runtime<L>,
    handle: OrchestratorHandle,
    host: Arc<FakeHost>,
    sink: Arc<RecordingSink>,
    fs: MockFileSystem,
}

fn harness<L: LaunchBackend>(
    registry: GroupRegistry,
    host: Arc<FakeHost>,
    launcher: L,
    exit_when_idle: bool,
) -> Harness<L> {
    let fs = MockFileSystem::new();
    let store = ConfigStore::with_fs(PathBuf::from(CONFIG), Arc::new(fs.clone()));
    let sink = RecordingSink::new();
    let (handle, rx) = OrchestratorHandle::channel(16);
    let options = RuntimeOptions {
        tick_interval: Duration::from_secs(1),
        exit_when_idle,
    };
    let runtime = Runtime::new(
        OrchestratorCore::new(registry),
        store,
        host.clone(),
        launcher,
        sink.clone(),
        rx,
        options,
    );
    Harness {
        runtime,
        handle,
        host,
        sink,
        fs,
    }
}

fn spawn<L: LaunchBackend + 'static>(runtime: Runtime<L>) -> JoinHandle<Result<()>> {
    tokio::spawn(runtime.run())
}

#[tokio::test(start_paused = true)]
async fn group_entries_fire_after_their_own_delays() -> TestResult {
    init_tracing();
    let registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A").delay(0))
        .with("g", LaunchTargetBuilder::new("B").delay(5))
        .build();
    let launcher = RecordingLauncher::new();
    let h = harness(registry, FakeHost::new(&["A", "B"]), launcher.clone(), true);

    let t0 = Instant::now();
    let reply = h.handle.send_request(Action::RunGroup("g".into())).await?;
    let task = spawn(h.runtime);

    match reply.await? {
        Ok(ActionReport::Enqueued(ids)) => assert_eq!(ids.len(), 2),
        other => panic!("expected Enqueued, got {other:?}"),
    }
    drop(h.handle);
    task.await??;

    let fired = launcher.fired();
    assert_eq!(launcher.fired_names(), vec!["A", "B"]);
    assert_eq!(fired[0].1.duration_since(t0), Duration::ZERO);

    let b_after = fired[1].1.duration_since(t0);
    assert!(b_after >= Duration::from_secs(5), "B fired early: {b_after:?}");
    assert!(b_after < Duration::from_secs(6), "B fired late: {b_after:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn launch_of_a_removed_target_is_skipped_and_others_still_fire() -> TestResult {
    init_tracing();
    let registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A").delay(1))
        .with("g", LaunchTargetBuilder::new("B").delay(1))
        .with("g", LaunchTargetBuilder::new("C").delay(2))
        .build();
    let host = FakeHost::new(&["A", "B", "C"]);
    let launcher = HostLauncher::new(host.clone());
    let h = harness(registry, host, launcher, true);
    let task = spawn(h.runtime);

    let ids = h.handle.run_group("g").await?;
    assert_eq!(ids.len(), 3);

    // A disappears from the project and the registry before it is due.
    h.host.forget("A");
    h.handle.remove_target(target("g", "A", 1)).await?;
    drop(h.handle);
    with_timeout(task).await??;

    assert_eq!(h.host.started_names(), vec!["B", "C"]);
    let errors = h.sink.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0], format!("launch {} skipped: target 'A' not found", ids[0]));
    assert!(h.sink.contains("started 'C' (group g)"));

    let saved = h.fs.contents(CONFIG).unwrap();
    assert!(!saved.contains("\"A\""));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_still_drains_pending_launches() -> TestResult {
    init_tracing();
    let registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A").delay(3))
        .with("g", LaunchTargetBuilder::new("B").delay(10))
        .build();
    let launcher = RecordingLauncher::new();
    let h = harness(registry, FakeHost::new(&["A", "B"]), launcher.clone(), true);
    let task = spawn(h.runtime);

    let t0 = Instant::now();
    h.handle.run_group("g").await?;
    drop(h.handle);
    task.await??;

    assert_eq!(launcher.fired_names(), vec!["A", "B"]);
    assert!(Instant::now().duration_since(t0) >= Duration::from_secs(10));
    assert!(!h.sink.contains("discarded"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_launch_is_not_retried() -> TestResult {
    let registry = RegistryBuilder::new()
        .with("one", LaunchTargetBuilder::new("A"))
        .with("two", LaunchTargetBuilder::new("B").delay(3))
        .build();
    let launcher = RecordingLauncher::new();
    launcher.fail("A");
    let h = harness(registry, FakeHost::new(&["A", "B"]), launcher.clone(), true);

    let reply = h.handle.send_request(Action::RunAll).await?;
    let task = spawn(h.runtime);
    assert!(matches!(reply.await?, Ok(ActionReport::Enqueued(ids)) if ids.len() == 2));
    drop(h.handle);
    task.await??;

    assert_eq!(launcher.fired_names(), vec!["B"]);
    assert_eq!(h.sink.errors().len(), 1);
    assert!(h.sink.errors()[0].contains("refused"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelled_launch_never_fires() -> TestResult {
    let registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A").delay(2))
        .with("g", LaunchTargetBuilder::new("B").delay(4))
        .build();
    let launcher = RecordingLauncher::new();
    let h = harness(registry, FakeHost::new(&["A", "B"]), launcher.clone(), true);
    let task = spawn(h.runtime);

    let ids = h.handle.run_group("g").await?;
    let cancelled = h.handle.cancel(ids[1]).await?;
    assert_eq!(cancelled.map(|p| p.target.target_name), Some("B".to_string()));
    assert!(h.handle.cancel(ids[1]).await?.is_none());

    let status = h.handle.status().await?;
    assert_eq!(status.pending.len(), 1);
    assert_eq!(status.pending[0].id, ids[0]);

    drop(h.handle);
    task.await??;
    assert_eq!(launcher.fired_names(), vec!["A"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ad_hoc_run_one_and_run_entry() -> TestResult {
    let registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A"))
        .build();
    let launcher = RecordingLauncher::new();
    let h = harness(registry, FakeHost::new(&["A", "X"]), launcher.clone(), false);
    let task = spawn(h.runtime);

    h.handle.run_one(target("adhoc", "X", 1)).await?;
    let report = h.handle.request(Action::RunEntry { group: "g".into(), index: 0 }).await?;
    assert!(matches!(report, ActionReport::Enqueued(ids) if ids.len() == 1));

    match h.handle.request(Action::RunEntry { group: "g".into(), index: 9 }).await {
        Err(BuildrunError::TargetNotFound(what)) => assert_eq!(what, "g[9]"),
        other => panic!("expected TargetNotFound, got {other:?}"),
    }
    match h.handle.run_group("nope").await {
        Err(BuildrunError::GroupNotFound(g)) => assert_eq!(g, "nope"),
        other => panic!("expected GroupNotFound, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    let mut names = launcher.fired_names();
    names.sort();
    assert_eq!(names, vec!["A", "X"]);

    h.handle.shutdown().await?;
    task.await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn mutations_are_saved_and_rolled_back_when_saving_fails() -> TestResult {
    let h = harness(
        GroupRegistry::new(),
        FakeHost::new(&["A", "B"]),
        RecordingLauncher::new(),
        false,
    );
    let fs = h.fs.clone();
    let task = spawn(h.runtime);

    h.handle.add_target(target("servers", "A", 2)).await?;
    let saved = fs.contents(CONFIG).unwrap();
    assert!(saved.contains("\"servers\""));
    assert!(saved.contains("\"A\""));

    fs.fail_writes(true);
    assert!(h.handle.add_target(target("servers", "B", 0)).await.is_err());
    let status = h.handle.status().await?;
    assert_eq!(status.registry.len(), 1);
    assert!(h.sink.contains("could not save"));
    fs.fail_writes(false);

    match h.handle.remove_target(target("servers", "B", 0)).await {
        Err(BuildrunError::TargetNotFound(_)) => {}
        other => panic!("expected TargetNotFound, got {other:?}"),
    }

    let report = h
        .handle
        .request(Action::ReplaceTarget {
            old: target("servers", "A", 2),
            new: target("servers", "A", 7),
        })
        .await?;
    assert!(matches!(report, ActionReport::Saved));

    let report = h
        .handle
        .request(Action::RemoveEntry { group: "servers".into(), index: 0 })
        .await?;
    match report {
        ActionReport::Removed(t) => assert_eq!(t.delay_seconds, 7),
        other => panic!("expected Removed, got {other:?}"),
    }
    // The emptied group is kept on disk.
    assert!(fs.contents(CONFIG).unwrap().contains("\"servers\": []"));

    h.handle.shutdown().await?;
    task.await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_launches() -> TestResult {
    let registry = RegistryBuilder::new()
        .with("g", LaunchTargetBuilder::new("A").delay(100))
        .build();
    let launcher = RecordingLauncher::new();
    let h = harness(registry, FakeHost::new(&["A"]), launcher.clone(), false);
    let task = spawn(h.runtime);

    h.handle.run_group("g").await?;
    h.handle.shutdown().await?;
    task.await??;

    assert!(launcher.fired().is_empty());
    assert!(h.sink.contains("1 pending launch(es) discarded"));
    assert!(matches!(
        h.handle.status().await,
        Err(BuildrunError::RuntimeClosed)
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn run_all_on_an_empty_registry_exits_at_once() -> TestResult {
    let h = harness(GroupRegistry::new(), FakeHost::new(&[]), RecordingLauncher::new(), true);
    let reply = h.handle.send_request(Action::RunAll).await?;
    let task = spawn(h.runtime);

    assert!(matches!(reply.await?, Ok(ActionReport::Enqueued(ids)) if ids.is_empty()));
    drop(h.handle);
    task.await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn clean_goes_through_the_host() -> TestResult {
    let h = harness(GroupRegistry::new(), FakeHost::new(&[]), RecordingLauncher::new(), false);
    let task = spawn(h.runtime);

    let report = h.handle.request(Action::Clean).await?;
    assert!(matches!(report, ActionReport::Cleaning));
    assert_eq!(h.host.clean_count(), 1);

    h.handle.shutdown().await?;
    task.await??;
    Ok(())
}

#[tokio::test]
async fn missing_build_program_leaves_the_build_idle() -> TestResult {
    let host = FakeHost::new(&[]);
    host.set_build_command(buildrun::exec::BuildCommand::new("/no/such/fbuild", "/"));
    let h = harness(GroupRegistry::new(), host, RecordingLauncher::new(), false);
    let task = spawn(h.runtime);

    match h.handle.toggle_build().await? {
        ActionReport::BuildNotStarted(msg) => assert!(msg.contains("/no/such/fbuild")),
        other => panic!("expected BuildNotStarted, got {other:?}"),
    }
    assert_eq!(h.handle.status().await?.build, BuildProcessState::Idle);
    assert!(matches!(
        h.handle.request(Action::StopBuild).await?,
        ActionReport::BuildIdle
    ));

    h.handle.shutdown().await?;
    with_timeout(task).await??;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn second_build_request_is_rejected_and_toggle_stops_the_first() -> TestResult {
    init_tracing();
    let host = FakeHost::new(&[]);
    host.set_build_command(buildrun::exec::BuildCommand::new("sleep", "/").arg("30"));
    let h = harness(GroupRegistry::new(), host, RecordingLauncher::new(), false);
    let task = spawn(h.runtime);

    assert!(matches!(
        h.handle.request(Action::StartBuild { target: None }).await?,
        ActionReport::BuildStarted
    ));
    assert!(matches!(
        h.handle.request(Action::StartBuild { target: None }).await,
        Err(BuildrunError::AlreadyRunning)
    ));
    assert!(h.sink.contains("build already running: sleep 30"));

    let status = h.handle.status().await?;
    assert!(status.build.is_running());
    assert_eq!(status.build_command.as_deref(), Some("sleep 30"));

    assert!(matches!(
        h.handle.toggle_build().await?,
        ActionReport::BuildStopping
    ));

    h.handle.shutdown().await?;
    with_timeout(task).await??;
    Ok(())
}
