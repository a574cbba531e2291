// src/engine/handle.rs

//! Client side of the runtime actor.

use tokio::sync::{mpsc, oneshot};

use crate::config::LaunchTarget;
use crate::errors::{BuildrunError, Result};
use crate::sched::{LaunchId, PendingLaunch};

use super::{Action, ActionReport, RuntimeEvent, StatusSnapshot};

pub type PendingReply = oneshot::Receiver<Result<ActionReport>>;

/// Cloneable handle used by the console, the CLI and tests to drive a
/// running [`super::Runtime`].
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl OrchestratorHandle {
    /// Create a handle and the receiver the runtime consumes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RuntimeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Send an action and wait for its result.
    pub async fn request(&self, action: Action) -> Result<ActionReport> {
        let reply = self.send_request(action).await?;
        reply.await.map_err(|_| BuildrunError::RuntimeClosed)?
    }

    /// Queue an action and return the receiver for its result.
    ///
    /// Lets a caller enqueue work before the runtime task is spawned.
    pub async fn send_request(&self, action: Action) -> Result<PendingReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RuntimeEvent::Action {
                action,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| BuildrunError::RuntimeClosed)?;
        Ok(reply_rx)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(RuntimeEvent::ShutdownRequested)
            .await
            .map_err(|_| BuildrunError::RuntimeClosed)
    }

    pub async fn toggle_build(&self) -> Result<ActionReport> {
        self.request(Action::ToggleBuild).await
    }

    pub async fn run_one(&self, target: LaunchTarget) -> Result<LaunchId> {
        let ids = expect_enqueued(self.request(Action::RunOne(target)).await?)?;
        ids.into_iter()
            .next()
            .ok_or_else(|| unexpected("run_one enqueued nothing"))
    }

    pub async fn run_group(&self, group: impl Into<String>) -> Result<Vec<LaunchId>> {
        expect_enqueued(self.request(Action::RunGroup(group.into())).await?)
    }

    pub async fn run_all(&self) -> Result<Vec<LaunchId>> {
        expect_enqueued(self.request(Action::RunAll).await?)
    }

    pub async fn add_target(&self, target: LaunchTarget) -> Result<()> {
        self.request(Action::AddTarget(target)).await.map(|_| ())
    }

    pub async fn remove_target(&self, target: LaunchTarget) -> Result<()> {
        self.request(Action::RemoveTarget(target)).await.map(|_| ())
    }

    pub async fn cancel(&self, id: LaunchId) -> Result<Option<PendingLaunch>> {
        match self.request(Action::CancelLaunch(id)).await? {
            ActionReport::Cancelled(launch) => Ok(launch),
            other => Err(unexpected(format!("cancel answered {other:?}"))),
        }
    }

    pub async fn status(&self) -> Result<StatusSnapshot> {
        match self.request(Action::Status).await? {
            ActionReport::Status(snapshot) => Ok(snapshot),
            other => Err(unexpected(format!("status answered {other:?}"))),
        }
    }
}

fn expect_enqueued(report: ActionReport) -> Result<Vec<LaunchId>> {
    match report {
        ActionReport::Enqueued(ids) => Ok(ids),
        other => Err(unexpected(format!("expected Enqueued, got {other:?}"))),
    }
}

fn unexpected(msg: impl Into<String>) -> BuildrunError {
    BuildrunError::Other(anyhow::anyhow!(msg.into()))
}
