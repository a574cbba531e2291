// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `buildrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildrun",
    version,
    about = "Trigger a distributed build and launch groups of targets with per-target delays.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workspace manifest (TOML).
    ///
    /// Default: `Workspace.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Workspace.toml", global = true)]
    pub manifest: String,

    /// Override the launch-configuration side file.
    ///
    /// If omitted, `<manifest dir>/<workspace name>.launch.json` is used.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Scheduler tick period in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000, global = true)]
    pub tick_ms: u64,

    /// Send build output and launch results to the log (stderr) instead
    /// of stdout.
    #[arg(long, global = true)]
    pub headless: bool,

    /// Load and print manifest + launch groups, but don't execute anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print every group and its launch targets.
    List,

    /// Add a launch target to a group.
    Add {
        #[arg(long, default_value = "default")]
        group: String,
        #[arg(long)]
        target: String,
        #[arg(long, default_value = "")]
        args: String,
        #[arg(long, default_value = "${TargetDir}")]
        dir: String,
        #[arg(long, default_value_t = 0)]
        delay: u32,
    },

    /// Remove the launch target at `index` in `group`.
    Remove {
        #[arg(long)]
        group: String,
        #[arg(long)]
        index: usize,
    },

    /// Launch one entry of a group after its delay.
    Run { group: String, index: usize },

    /// Launch every entry of a group, each after its own delay.
    RunGroup { group: String },

    /// Launch every entry of every group.
    RunAll,

    /// Run the distributed build and stream its output.
    Build {
        /// Build a single target instead of the whole workspace.
        #[arg(long)]
        target: Option<String>,
    },

    /// Clean build outputs through the host.
    Clean,

    /// Interactive mode: read commands from stdin.
    Console,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
