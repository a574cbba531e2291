// src/sink.rs

//! User-facing output sink.
//!
//! Build output and launch results are pushed here line by line. Producers
//! run on tokio tasks distinct from the orchestrator loop, so every sink must
//! be `Send + Sync`; [`ChannelSink`] hands lines to a single consumer over an
//! unbounded channel.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Where a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// stdout/stderr of the supervised build process, and its lifecycle.
    Build,
    /// Results of deferred launches.
    Launch,
    /// Clean requests.
    Clean,
    /// Everything else the orchestrator reports.
    Orchestrator,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogSource::Build => "build",
            LogSource::Launch => "launch",
            LogSource::Clean => "clean",
            LogSource::Orchestrator => "buildrun",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub source: LogSource,
    pub text: String,
    /// Failure reports are flagged so consumers can highlight them.
    pub is_error: bool,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.text)
    }
}

/// Append-only line sink.
pub trait LogSink: Send + Sync + fmt::Debug {
    fn push(&self, line: LogLine);
}

impl dyn LogSink + '_ {
    pub fn info(&self, source: LogSource, text: impl Into<String>) {
        self.push(LogLine {
            source,
            text: text.into(),
            is_error: false,
        });
    }

    pub fn error(&self, source: LogSource, text: impl Into<String>) {
        self.push(LogLine {
            source,
            text: text.into(),
            is_error: true,
        });
    }
}

pub type SharedSink = Arc<dyn LogSink>;

/// Forwards lines to a single consumer task.
///
/// Lines pushed after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    fn push(&self, line: LogLine) {
        let _ = self.tx.send(line);
    }
}

/// Emits every line as a `tracing` event under the `buildrun::output` target.
///
/// Used in headless mode, where stdout is not watched and everything should
/// end up in the log.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn push(&self, line: LogLine) {
        if line.is_error {
            warn!(target: "buildrun::output", source = %line.source, "{}", line.text);
        } else {
            info!(target: "buildrun::output", source = %line.source, "{}", line.text);
        }
    }
}
