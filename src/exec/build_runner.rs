// src/exec/build_runner.rs

//! Drives one spawned build process to completion or cancellation.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sink::{LogSource, SharedSink};

/// How long output readers may lag behind process exit.
const READER_GRACE: Duration = Duration::from_secs(2);

/// How a supervised build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildExit {
    /// The process exited on its own. `None` when killed by a signal.
    Exited { code: Option<i32>, success: bool },
    /// `stop()` killed the process.
    Killed,
    /// Waiting on the process failed.
    Lost,
}

/// Stream output of `child` into `sink` until it exits or `cancel_rx` fires.
///
/// Output readers are joined before the final status line is pushed, so the
/// sink sees every output line before "build finished".
pub async fn run_build(
    mut child: Child,
    command_line: String,
    sink: SharedSink,
    mut cancel_rx: oneshot::Receiver<()>,
) -> BuildExit {
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, "stdout", sink.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, "stderr", sink.clone()));
    }

    let exit = tokio::select! {
        status_res = child.wait() => {
            match status_res {
                Ok(status) => {
                    info!(
                        cmd = %command_line,
                        exit_code = ?status.code(),
                        success = status.success(),
                        "build process exited"
                    );
                    BuildExit::Exited { code: status.code(), success: status.success() }
                }
                Err(e) => {
                    warn!(cmd = %command_line, error = %e, "waiting for build process failed");
                    BuildExit::Lost
                }
            }
        }

        cancel = &mut cancel_rx => {
            if cancel.is_ok() {
                info!(cmd = %command_line, "stop requested; killing build process");
            } else {
                debug!(cmd = %command_line, "supervisor dropped; killing build process");
            }
            if let Err(e) = child.kill().await {
                warn!(cmd = %command_line, error = %e, "failed to kill build process");
            }
            BuildExit::Killed
        }
    };

    // A grandchild may inherit the pipes and outlive the build; don't wait on it forever.
    for mut reader in readers {
        if tokio::time::timeout(READER_GRACE, &mut reader).await.is_err() {
            debug!(cmd = %command_line, "output reader still open after exit; aborting");
            reader.abort();
        }
    }

    match exit {
        BuildExit::Exited { code, success: true } => {
            sink.info(LogSource::Build, format!("build finished (exit code {})", fmt_code(code)));
        }
        BuildExit::Exited { code, success: false } => {
            sink.error(LogSource::Build, format!("build failed (exit code {})", fmt_code(code)));
        }
        BuildExit::Killed => sink.info(LogSource::Build, "build stopped"),
        BuildExit::Lost => sink.error(LogSource::Build, "lost track of the build process"),
    }

    exit
}

fn fmt_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

/// Push each line of `stream` to the sink as it arrives.
///
/// Bytes are decoded lossily; build engines on some hosts emit non-UTF-8
/// code pages.
fn spawn_line_reader<R>(stream: R, stream_name: &'static str, sink: SharedSink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf);
                    debug!(stream = stream_name, "{}", line);
                    sink.info(LogSource::Build, line.into_owned());
                }
                Err(e) => {
                    debug!(stream = stream_name, error = %e, "build output read failed");
                    break;
                }
            }
        }
    })
}
