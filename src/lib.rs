// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod host;
pub mod logging;
pub mod sched;
pub mod sink;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{
    ConfigStore, GroupRegistry, LaunchTarget, launch_config_path, load_manifest,
    manifest_root_dir,
};
use crate::console::{ConsoleCommand, HELP, parse_command};
use crate::engine::{
    Action, ActionReport, OrchestratorCore, OrchestratorHandle, Runtime, RuntimeOptions,
    StatusSnapshot,
};
use crate::errors::BuildrunError;
use crate::exec::HostLauncher;
use crate::host::{HostEnvironment, WorkspaceHost};
use crate::sink::{ChannelSink, LogLine, SharedSink, TracingSink};

/// How long to keep printing sink output after the runtime stops.
const OUTPUT_DRAIN: Duration = Duration::from_millis(200);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest and launch-config loading
/// - the workspace host and its output sink
/// - the orchestrator runtime (for run/build/clean/console)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let manifest_path = PathBuf::from(&args.manifest);
    let manifest = load_manifest(&manifest_path)
        .with_context(|| format!("loading manifest {}", manifest_path.display()))?;
    let root = manifest_root_dir(&manifest_path);
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| launch_config_path(&manifest_path, &manifest));

    let (sink, printer): (SharedSink, _) = if args.headless {
        (Arc::new(TracingSink), None)
    } else {
        let (sink, lines) = ChannelSink::new();
        (Arc::new(sink), Some(tokio::spawn(print_output(lines))))
    };

    let host: Arc<dyn HostEnvironment> = Arc::new(WorkspaceHost::new(root, manifest, sink.clone()));
    let store = ConfigStore::new(&config_path);

    if args.dry_run {
        print_dry_run(host.as_ref(), &store)?;
        return Ok(());
    }

    let result = dispatch(&args, host, store, sink).await;

    // Every sink clone we own is gone; give the printer a moment to flush
    // what the runtime pushed last.
    if let Some(printer) = printer {
        if tokio::time::timeout(OUTPUT_DRAIN, printer).await.is_err() {
            debug!("output printer still attached to running instances; detaching");
        }
    }
    result
}

async fn dispatch(
    args: &CliArgs,
    host: Arc<dyn HostEnvironment>,
    store: ConfigStore,
    sink: SharedSink,
) -> Result<()> {
    match &args.command {
        Command::List => {
            let registry = store.load(&host.known_targets())?;
            print_registry(&registry);
            Ok(())
        }
        Command::Add {
            group,
            target,
            args: target_args,
            dir,
            delay,
        } => {
            if host.resolve(target).is_none() {
                warn!(target = %target, "target is not declared in the manifest");
            }
            let mut registry = store.load(&host.known_targets())?;
            registry.add(LaunchTarget {
                group: group.clone(),
                target_name: target.clone(),
                args: target_args.clone(),
                working_dir: dir.clone(),
                delay_seconds: *delay,
            });
            store.save(&registry)?;
            println!("added '{target}' to group '{group}'");
            Ok(())
        }
        Command::Remove { group, index } => {
            let mut registry = store.load(&host.known_targets())?;
            let removed = registry
                .remove_at(group, *index)
                .ok_or_else(|| BuildrunError::TargetNotFound(format!("{group}[{index}]")))?;
            store.save(&registry)?;
            println!("removed '{}' from group '{group}'", removed.target_name);
            Ok(())
        }
        Command::Run { group, index } => {
            one_shot(
                args,
                host,
                store,
                sink,
                Action::RunEntry {
                    group: group.clone(),
                    index: *index,
                },
            )
            .await
        }
        Command::RunGroup { group } => {
            one_shot(args, host, store, sink, Action::RunGroup(group.clone())).await
        }
        Command::RunAll => one_shot(args, host, store, sink, Action::RunAll).await,
        Command::Build { target } => {
            let action = Action::StartBuild {
                target: target.clone(),
            };
            one_shot(args, host, store, sink, action).await
        }
        Command::Clean => one_shot(args, host, store, sink, Action::Clean).await,
        Command::Console => console(args, host, store, sink).await,
    }
}

struct Started {
    handle: OrchestratorHandle,
    task: tokio::task::JoinHandle<errors::Result<()>>,
}

/// Load the registry and spawn the runtime.
///
/// `first` is queued before the runtime task starts so the first tick
/// already sees its launches.
async fn start_runtime(
    args: &CliArgs,
    host: Arc<dyn HostEnvironment>,
    store: ConfigStore,
    sink: SharedSink,
    exit_when_idle: bool,
    first: Option<Action>,
) -> Result<(Started, Option<engine::PendingReply>)> {
    let registry = store.load(&host.known_targets())?;
    let core = OrchestratorCore::new(registry);

    let (handle, rx) = OrchestratorHandle::channel(64);
    let reply = match first {
        Some(action) => Some(handle.send_request(action).await?),
        None => None,
    };

    let options = RuntimeOptions {
        tick_interval: Duration::from_millis(args.tick_ms.max(1)),
        exit_when_idle,
    };
    let launcher = HostLauncher::new(host.clone());
    let runtime = Runtime::new(core, store, host, launcher, sink, rx, options);
    let task = tokio::spawn(runtime.run());

    spawn_ctrl_c(handle.clone());
    Ok((Started { handle, task }, reply))
}

fn spawn_ctrl_c(handle: OrchestratorHandle) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = handle.shutdown().await;
    });
}

/// Run a single action, then keep ticking until nothing is pending and no
/// build is running.
async fn one_shot(
    args: &CliArgs,
    host: Arc<dyn HostEnvironment>,
    store: ConfigStore,
    sink: SharedSink,
    action: Action,
) -> Result<()> {
    let (started, reply) = start_runtime(args, host, store, sink, true, Some(action)).await?;
    let Started { handle, task } = started;

    if let Some(reply) = reply {
        match reply.await {
            Ok(Ok(report)) => print_report(&report),
            Ok(Err(e)) => {
                let _ = handle.shutdown().await;
                let _ = task.await;
                return Err(e.into());
            }
            Err(_) => return Err(BuildrunError::RuntimeClosed.into()),
        }
    }
    drop(handle);

    task.await.context("runtime task panicked")??;
    Ok(())
}

/// Interactive loop over stdin lines. EOF behaves like `quit`.
async fn console(
    args: &CliArgs,
    host: Arc<dyn HostEnvironment>,
    store: ConfigStore,
    sink: SharedSink,
) -> Result<()> {
    let (Started { handle, task }, _) = start_runtime(args, host, store, sink, false, None).await?;
    info!("console ready; type 'help' for commands");
    println!("{HELP}");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        match command {
            ConsoleCommand::Nothing => {}
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => break,
            ConsoleCommand::List => match handle.status().await {
                Ok(snapshot) => print_registry(&snapshot.registry),
                Err(BuildrunError::RuntimeClosed) => break,
                Err(e) => eprintln!("error: {e}"),
            },
            ConsoleCommand::Action(action) => match handle.request(action).await {
                Ok(report) => print_report(&report),
                Err(BuildrunError::RuntimeClosed) => break,
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }

    let _ = handle.shutdown().await;
    drop(handle);
    task.await.context("runtime task panicked")??;
    Ok(())
}

async fn print_output(mut lines: mpsc::UnboundedReceiver<LogLine>) {
    while let Some(line) = lines.recv().await {
        if line.is_error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

fn print_report(report: &ActionReport) {
    match report {
        ActionReport::BuildStarted => println!("build started"),
        ActionReport::BuildNotStarted(reason) => println!("build not started: {reason}"),
        ActionReport::BuildStopping => println!("stopping build"),
        ActionReport::BuildIdle => println!("no build running"),
        ActionReport::Cleaning => println!("clean started"),
        ActionReport::Enqueued(ids) if ids.is_empty() => println!("nothing to launch"),
        ActionReport::Enqueued(ids) => {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            println!("queued {}", ids.join(" "));
        }
        ActionReport::Saved => println!("saved"),
        ActionReport::Removed(t) => {
            println!("removed '{}' from group '{}'", t.target_name, t.group)
        }
        ActionReport::Cancelled(Some(p)) => {
            println!("cancelled {} ('{}')", p.id, p.target.target_name)
        }
        ActionReport::Cancelled(None) => println!("no such pending launch"),
        ActionReport::Status(snapshot) => print_status(snapshot),
    }
}

fn print_status(snapshot: &StatusSnapshot) {
    match &snapshot.build_command {
        Some(cmd) => println!("build: {} ({cmd})", snapshot.build),
        None => println!("build: {}", snapshot.build),
    }
    if snapshot.pending.is_empty() {
        println!("pending: none");
        return;
    }
    println!("pending ({}):", snapshot.pending.len());
    let now = tokio::time::Instant::now();
    for p in &snapshot.pending {
        let left = p.due_at.saturating_duration_since(now);
        println!(
            "  {}  {} / {}  in {:.1}s",
            p.id,
            p.target.group,
            p.target.target_name,
            left.as_secs_f64()
        );
    }
}

fn print_registry(registry: &GroupRegistry) {
    if registry.is_empty() {
        println!("no launch groups");
        return;
    }
    for (group, targets) in registry.groups() {
        println!("{group} ({}):", targets.len());
        for (idx, t) in targets.iter().enumerate() {
            println!(
                "  [{idx}] {}  delay={}s  dir={}  args={}",
                t.target_name, t.delay_seconds, t.working_dir, t.args
            );
        }
    }
}

/// Simple dry-run output: manifest targets, build command, launch groups.
/// Nothing is written, not even a default launch config.
fn print_dry_run(host: &dyn HostEnvironment, store: &ConfigStore) -> Result<()> {
    println!("buildrun dry-run");
    println!("  build: {}", host.build_command(None));
    println!("  launch config: {}", store.path().display());
    println!();

    let known = host.known_targets();
    println!("targets ({}):", known.len());
    for name in &known {
        if let Some(resolved) = host.resolve(name) {
            println!("  - {name}");
            println!("      exe: {}", resolved.exe.display());
            println!("      output dir: {}", resolved.output_dir.display());
        }
    }
    println!();

    let registry = if store.path().exists() {
        store.load(&known)?
    } else {
        println!("(launch config missing; would be seeded with defaults)");
        GroupRegistry::seeded(known.iter().cloned())
    };
    print_registry(&registry);

    debug!("dry-run complete (no execution)");
    Ok(())
}
