//! The host runtime seen from the gateway.
//!
//! Everything the gateway asks of its surroundings (showing notifications,
//! finding and focusing windows, messaging open pages, taking control of them)
//! goes through [`Host`], so handlers can run against a real proxy or a test
//! double alike.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::notifications::NotificationRequest;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An open application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    /// Absolute URL the window currently shows.
    pub url: String,
    pub focused: bool,
}

/// Messages delivered to open application instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Background sync finished; `timestamp` is milliseconds since the epoch.
    SyncComplete { timestamp: i64 },
    /// A notification is being displayed.
    Notification {
        title: String,
        notification: NotificationRequest,
    },
    /// The window should bring itself to the foreground.
    Focus,
    /// A new generation took control of this window.
    Claimed { generation: String },
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Display a notification. Completes once it is shown.
    async fn show_notification(&self, title: &str, notification: &NotificationRequest) -> Result<()>;

    /// Dismiss the notification carrying `tag`.
    async fn close_notification(&self, tag: &str) -> Result<()>;

    /// All open application windows.
    async fn match_windows(&self) -> Result<Vec<WindowClient>>;

    async fn focus(&self, client_id: &str) -> Result<()>;

    async fn open_window(&self, url: &str) -> Result<()>;

    async fn post_message(&self, client_id: &str, message: &ClientMessage) -> Result<()>;

    /// Take control of every open window. Returns how many were claimed.
    async fn claim(&self, generation: &str) -> Result<usize>;

    /// Told when the gateway stops waiting for older instances to close.
    async fn skip_waiting(&self) -> Result<()> {
        Ok(())
    }
}
