// Control messages and background sync
// Author: kelexine (https://github.com/kelexine)

use super::gateway::OfflineGateway;
use super::host::ClientMessage;
use super::lifecycle::WorkerState;
use crate::error::Result;
use crate::metrics;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Control message asking a waiting generation to activate now.
pub const SKIP_WAITING: &str = "SKIP_WAITING";
/// The only background-sync tag acted upon.
pub const SYNC_TAG: &str = "sync-data";

/// Application-defined work run on a `sync-data` trigger.
#[async_trait]
pub trait SyncTask: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Sync task that has nothing to synchronise.
pub struct NoopSync;

#[async_trait]
impl SyncTask for NoopSync {
    async fn run(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOutcome {
    SkipWaiting,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Sync ran; `notified` clients received `SYNC_COMPLETE`.
    Completed { notified: usize },
    Failed { reason: String },
    Ignored,
}

impl OfflineGateway {
    /// React to a message posted by a page. Only `{"type": "SKIP_WAITING"}`
    /// is recognised.
    ///
    /// Besides setting the flag and notifying the host, an `Installed`
    /// generation that is still waiting is activated on the spot. Activation
    /// failures are logged; the outcome stays `SkipWaiting`.
    pub async fn handle_message(&self, message: &Value) -> MessageOutcome {
        let kind = message.get("type").and_then(Value::as_str);
        if kind != Some(SKIP_WAITING) {
            debug!("Ignoring message {:?}", kind);
            return MessageOutcome::Ignored;
        }

        info!("Skip-waiting requested by client");
        self.inner.registration.lock().request_skip_waiting();
        if let Err(e) = self.inner.host.skip_waiting().await {
            warn!("Host rejected skip-waiting: {}", e);
        }
        if self.state() == WorkerState::Installed {
            match self.activate().await {
                Ok(report) => info!("Activated {} on client request", report.generation),
                Err(e) => error!("Activation on client request failed: {}", e),
            }
        }
        MessageOutcome::SkipWaiting
    }

    /// Run background sync for `tag`, then tell every window it finished.
    /// Failures are logged and reported, never retried.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        if tag != SYNC_TAG {
            debug!("Ignoring sync tag {}", tag);
            return SyncOutcome::Ignored;
        }

        match self.sync_and_broadcast().await {
            Ok(notified) => {
                metrics::record_sync(true);
                SyncOutcome::Completed { notified }
            }
            Err(e) => {
                error!("Background sync failed: {}", e);
                metrics::record_sync(false);
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn sync_and_broadcast(&self) -> Result<usize> {
        info!("Synchronising application data");
        self.inner.sync_task.run().await?;

        let message = ClientMessage::SyncComplete {
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let windows = self.inner.host.match_windows().await?;
        let mut notified = 0;
        for window in &windows {
            match self.inner.host.post_message(&window.id, &message).await {
                Ok(()) => notified += 1,
                Err(e) => warn!("Could not notify client {}: {}", window.id, e),
            }
        }
        Ok(notified)
    }
}
