//! The offline cache gateway core.
//!
//! [`OfflineGateway`] owns the current cache generation and answers the
//! events a browser worker would receive: install, activate, fetch, push,
//! notification clicks, control messages and background sync. Every handler
//! is an ordinary async method; [`OfflineGateway::dispatch`] routes a
//! [`WorkerEvent`] to the right one.
//!
//! # Components
//!
//! - `gateway`: construction and shared state.
//! - `lifecycle`: install (manifest population) and activate (stale sweep).
//! - `fetch`: cache-first request interception with offline fallbacks.
//! - `notifications`: push payloads and notification clicks.
//! - `messaging`: `SKIP_WAITING` and `sync-data`.
//! - `host`: the [`Host`] adapter trait.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod events;
pub mod fetch;
pub mod gateway;
pub mod host;
pub mod lifecycle;
pub mod messaging;
pub mod notifications;

pub use events::{EventOutcome, WorkerEvent};
pub use fetch::{FetchOutcome, ResponseSource};
pub use gateway::{GatewayBuilder, GatewayStatus, OfflineGateway};
pub use host::{ClientMessage, Host, WindowClient};
pub use lifecycle::{ActivationReport, InstallReport, WorkerState};
pub use messaging::{MessageOutcome, NoopSync, SyncOutcome, SyncTask, SKIP_WAITING, SYNC_TAG};
pub use notifications::{
    parse_push_payload, ClickOutcome, NotificationAction, NotificationClick, NotificationData,
    NotificationRequest, PushMessage, ACTION_READ, ACTION_SNOOZE,
};
