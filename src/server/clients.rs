// Local host - window clients connected over server-sent events
// Author: kelexine (https://github.com/kelexine)

use crate::error::{GatewayError, Result};
use crate::worker::{ClientMessage, Host, NotificationRequest, WindowClient};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Url;
use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

struct ClientHandle {
    client: WindowClient,
    tx: UnboundedSender<ClientMessage>,
}

/// [`Host`] for the proxy binary.
///
/// Pages register as window clients by holding open an SSE stream; messages
/// and notifications are pushed down those streams. Opening a window either
/// launches the system browser or is only logged.
pub struct LocalHost {
    origin: Url,
    launch_browser: bool,
    clients: RwLock<HashMap<String, ClientHandle>>,
    /// Displayed notifications by tag
    notifications: RwLock<HashMap<String, (String, NotificationRequest)>>,
}

impl LocalHost {
    pub fn new(origin: &str, launch_browser: bool) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| GatewayError::Config(format!("Invalid origin {}: {}", origin, e)))?;
        Ok(Self {
            origin,
            launch_browser,
            clients: RwLock::new(HashMap::new()),
            notifications: RwLock::new(HashMap::new()),
        })
    }

    /// Register a window showing `url` (absolute, or relative to the origin).
    pub fn register(&self, url: &str) -> (WindowClient, UnboundedReceiver<ClientMessage>) {
        let url = self
            .origin
            .join(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.origin.to_string());
        let client = WindowClient {
            id: uuid::Uuid::new_v4().to_string(),
            url,
            focused: false,
        };
        let (tx, rx) = unbounded_channel();
        debug!("Registered window client {} at {}", client.id, client.url);
        self.clients.write().insert(
            client.id.clone(),
            ClientHandle {
                client: client.clone(),
                tx,
            },
        );
        (client, rx)
    }

    pub fn unregister(&self, client_id: &str) {
        if self.clients.write().remove(client_id).is_some() {
            debug!("Window client {} disconnected", client_id);
        }
    }

    /// Notifications currently on screen, as `(title, notification)`.
    pub fn displayed(&self) -> Vec<(String, NotificationRequest)> {
        self.notifications.read().values().cloned().collect()
    }

    fn send(&self, client_id: &str, message: ClientMessage) -> Result<()> {
        let clients = self.clients.read();
        let handle = clients
            .get(client_id)
            .ok_or_else(|| GatewayError::Host(format!("Unknown client {}", client_id)))?;
        handle
            .tx
            .send(message)
            .map_err(|_| GatewayError::Host(format!("Client {} is gone", client_id)))
    }

    fn prune_closed(&self) {
        self.clients.write().retain(|_, handle| !handle.tx.is_closed());
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn show_notification(&self, title: &str, notification: &NotificationRequest) -> Result<()> {
        info!("🔔 {}: {}", title, notification.body);
        self.notifications.write().insert(
            notification.tag.clone(),
            (title.to_string(), notification.clone()),
        );
        let message = ClientMessage::Notification {
            title: title.to_string(),
            notification: notification.clone(),
        };
        for handle in self.clients.read().values() {
            let _ = handle.tx.send(message.clone());
        }
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<()> {
        self.notifications.write().remove(tag);
        Ok(())
    }

    async fn match_windows(&self) -> Result<Vec<WindowClient>> {
        self.prune_closed();
        Ok(self
            .clients
            .read()
            .values()
            .map(|handle| handle.client.clone())
            .collect())
    }

    async fn focus(&self, client_id: &str) -> Result<()> {
        self.send(client_id, ClientMessage::Focus)?;
        for (id, handle) in self.clients.write().iter_mut() {
            handle.client.focused = id == client_id;
        }
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<()> {
        if !self.launch_browser {
            info!("Open window requested: {}", url);
            return Ok(());
        }
        let url = url.to_string();
        tokio::task::spawn_blocking(move || open::that(&url))
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?
            .map_err(|e| GatewayError::Host(format!("Failed to launch browser: {}", e)))
    }

    async fn post_message(&self, client_id: &str, message: &ClientMessage) -> Result<()> {
        self.send(client_id, message.clone())
    }

    async fn claim(&self, generation: &str) -> Result<usize> {
        self.prune_closed();
        let message = ClientMessage::Claimed {
            generation: generation.to_string(),
        };
        let mut claimed = 0;
        for (id, handle) in self.clients.read().iter() {
            match handle.tx.send(message.clone()) {
                Ok(()) => claimed += 1,
                Err(_) => warn!("Client {} vanished during claim", id),
            }
        }
        Ok(claimed)
    }
}
