//! Push notifications and clicks on them.
//!
//! Push payloads are read as JSON: an object may carry `body` and `url`, a
//! bare string is the body. An absent or unreadable payload falls back to the
//! configured reminder text.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::gateway::OfflineGateway;
use crate::error::Result;
use crate::metrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Action id that opens or focuses the app.
pub const ACTION_READ: &str = "read";
/// Action id that defers the reminder.
pub const ACTION_SNOOZE: &str = "snooze";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Data carried with a notification and handed back on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationData {
    #[serde(default)]
    pub url: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,
}

/// A notification display request. Built per push and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
    pub tag: String,
    pub renotify: bool,
    pub require_interaction: bool,
}

/// What a push payload contributes to the notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushMessage {
    pub body: Option<String>,
    pub url: Option<String>,
}

/// Read a push payload. Anything that is not a JSON object or string yields
/// an empty message.
pub fn parse_push_payload(payload: Option<&[u8]>) -> PushMessage {
    let Some(raw) = payload.filter(|p| !p.is_empty()) else {
        return PushMessage::default();
    };

    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => PushMessage {
            body: map
                .get("body")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            url: map
                .get("url")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        },
        Ok(Value::String(body)) if !body.is_empty() => PushMessage {
            body: Some(body),
            url: None,
        },
        Ok(_) => PushMessage::default(),
        Err(e) => {
            warn!("Ignoring malformed push payload: {}", e);
            PushMessage::default()
        }
    }
}

/// A click on a notification, optionally on one of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationClick {
    #[serde(default)]
    pub action: Option<String>,
    /// Tag of the clicked notification; the configured tag when absent.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Focused { client_id: String },
    Opened { url: String },
    Deferred,
}

impl OfflineGateway {
    /// Build the notification for a push payload.
    pub fn build_notification(&self, payload: Option<&[u8]>) -> NotificationRequest {
        let message = parse_push_payload(payload);
        let config = &self.inner.notifications;

        NotificationRequest {
            body: message.body.unwrap_or_else(|| config.default_body.clone()),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: config.vibrate.clone(),
            data: NotificationData {
                url: Some(message.url.unwrap_or_else(|| "/".to_string())),
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_READ.to_string(),
                    title: config.read_action_title.clone(),
                },
                NotificationAction {
                    action: ACTION_SNOOZE.to_string(),
                    title: config.snooze_action_title.clone(),
                },
            ],
            tag: config.tag.clone(),
            renotify: true,
            require_interaction: true,
        }
    }

    /// Show a notification for an incoming push. Completes once displayed.
    pub async fn handle_push(&self, payload: Option<&[u8]>) -> Result<NotificationRequest> {
        let notification = self.build_notification(payload);
        debug!("Showing notification: {}", notification.body);
        self.inner
            .host
            .show_notification(&self.inner.notifications.title, &notification)
            .await?;
        metrics::record_notification("shown");
        Ok(notification)
    }

    /// Close the clicked notification, then act on the chosen action.
    pub async fn handle_notification_click(&self, click: &NotificationClick) -> Result<ClickOutcome> {
        let host = &self.inner.host;
        let tag = click
            .tag
            .as_deref()
            .unwrap_or(&self.inner.notifications.tag);
        host.close_notification(tag).await?;

        match click.action.as_deref() {
            Some(ACTION_READ) => {
                metrics::record_notification("read");
                let scope = self.resolve(&self.config().scope)?;
                let windows = host.match_windows().await?;
                if let Some(window) = windows.iter().find(|w| w.url.starts_with(&scope)) {
                    info!("Focusing window {}", window.id);
                    host.focus(&window.id).await?;
                    return Ok(ClickOutcome::Focused {
                        client_id: window.id.clone(),
                    });
                }
                let url = self.resolve("/")?;
                host.open_window(&url).await?;
                Ok(ClickOutcome::Opened { url })
            }
            Some(ACTION_SNOOZE) | Some("defer") => {
                info!("Reminder deferred");
                metrics::record_notification("snooze");
                Ok(ClickOutcome::Deferred)
            }
            other => {
                if let Some(action) = other {
                    debug!("Unknown notification action '{}', opening target", action);
                }
                metrics::record_notification("open");
                let target = click.data.url.as_deref().unwrap_or("/");
                let url = self.resolve(target)?;
                host.open_window(&url).await?;
                Ok(ClickOutcome::Opened { url })
            }
        }
    }
}
