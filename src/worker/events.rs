// Event bus - one entry point for every worker event
// Author: kelexine (https://github.com/kelexine)

use super::fetch::FetchOutcome;
use super::gateway::OfflineGateway;
use super::lifecycle::{ActivationReport, InstallReport};
use super::messaging::{MessageOutcome, SyncOutcome};
use super::notifications::{ClickOutcome, NotificationClick, NotificationRequest};
use crate::error::Result;
use crate::network::InterceptedRequest;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

/// Events the gateway consumes from its host.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(InterceptedRequest),
    Push(Option<Bytes>),
    NotificationClick(NotificationClick),
    Message(Value),
    Sync(String),
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Push(_) => "push",
            WorkerEvent::NotificationClick(_) => "notificationclick",
            WorkerEvent::Message(_) => "message",
            WorkerEvent::Sync(_) => "sync",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    Notified(NotificationRequest),
    Clicked(ClickOutcome),
    Message(MessageOutcome),
    Synced(SyncOutcome),
}

impl OfflineGateway {
    /// Route an event to its handler and wait for all of its work.
    /// Background cache writes started by a fetch are not waited for.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome> {
        debug!("Dispatching {} event", event.name());
        Ok(match event {
            WorkerEvent::Install => EventOutcome::Installed(self.install().await?),
            WorkerEvent::Activate => EventOutcome::Activated(self.activate().await?),
            WorkerEvent::Fetch(request) => EventOutcome::Fetched(self.handle_fetch(&request).await),
            WorkerEvent::Push(payload) => {
                EventOutcome::Notified(self.handle_push(payload.as_deref()).await?)
            }
            WorkerEvent::NotificationClick(click) => {
                EventOutcome::Clicked(self.handle_notification_click(&click).await?)
            }
            WorkerEvent::Message(message) => EventOutcome::Message(self.handle_message(&message).await),
            WorkerEvent::Sync(tag) => EventOutcome::Synced(self.handle_sync(&tag).await),
        })
    }
}
