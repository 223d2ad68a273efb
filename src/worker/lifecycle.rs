//! Install and activate handling.
//!
//! A generation moves `Parsed → Installing → Installed → Activating →
//! Activated`. A failed install leaves it `Redundant`; the previous
//! generation keeps serving and a later install may be attempted.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::gateway::OfflineGateway;
use crate::cache::{CacheEntry, CacheKey};
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::network::InterceptedRequest;
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

#[derive(Debug)]
pub struct Registration {
    state: WorkerState,
    skip_waiting: bool,
}

impl Default for Registration {
    fn default() -> Self {
        Self {
            state: WorkerState::Parsed,
            skip_waiting: false,
        }
    }
}

impl Registration {
    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting
    }

    /// Only an installed generation takes runtime cache writes.
    pub fn accepts_writes(&self) -> bool {
        matches!(
            self.state,
            WorkerState::Installed | WorkerState::Activating | WorkerState::Activated
        )
    }

    pub fn request_skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    fn transition(&mut self, from: &[WorkerState], to: WorkerState) -> Result<()> {
        if !from.contains(&self.state) {
            return Err(GatewayError::InvalidState(format!(
                "cannot move from {:?} to {:?}",
                self.state, to
            )));
        }
        self.state = to;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Number of manifest entries committed.
    pub cached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub generation: String,
    /// Stale generations removed by the sweep.
    pub deleted: Vec<String>,
    /// Windows taken over by this generation.
    pub clients_claimed: usize,
}

impl OfflineGateway {
    /// Populate the current generation with every manifest asset.
    ///
    /// All assets are fetched before anything is written. One failed or
    /// non-OK fetch fails the whole install and nothing is committed.
    pub async fn install(&self) -> Result<InstallReport> {
        self.inner.registration.lock().transition(
            &[WorkerState::Parsed, WorkerState::Redundant],
            WorkerState::Installing,
        )?;

        let generation = self.cache().current_generation().to_string();
        // A generation left over from an earlier successful install is kept on failure
        let existed = self.cache().current_exists().await.unwrap_or(true);
        info!(
            "Installing cache generation {} ({} assets)",
            generation,
            self.config().manifest.len()
        );

        match self.populate_manifest().await {
            Ok(cached) => {
                {
                    let mut registration = self.inner.registration.lock();
                    registration.state = WorkerState::Installed;
                    registration.request_skip_waiting();
                }
                if let Err(e) = self.inner.host.skip_waiting().await {
                    warn!("Host rejected skip-waiting: {}", e);
                }
                metrics::record_lifecycle("install", true);
                info!("Installed {} with {} entries", generation, cached);
                Ok(InstallReport { generation, cached })
            }
            Err(e) => {
                self.inner.registration.lock().state = WorkerState::Redundant;
                metrics::record_lifecycle("install", false);
                error!("Install of {} failed: {}", generation, e);
                if !existed {
                    if let Err(discard) = self.cache().discard_current().await {
                        warn!("Could not remove failed generation {}: {}", generation, discard);
                    }
                }
                Err(match e {
                    GatewayError::Install(_) => e,
                    other => GatewayError::Install(other.to_string()),
                })
            }
        }
    }

    async fn populate_manifest(&self) -> Result<usize> {
        self.cache().open_current().await?;

        let requests = self
            .config()
            .manifest
            .iter()
            .map(|entry| self.resolve(entry).map(InterceptedRequest::get))
            .collect::<Result<Vec<_>>>()?;

        let fetcher = self.fetcher();
        let entries = try_join_all(requests.iter().map(|request| async move {
            let response = fetcher.fetch(request).await.map_err(|e| {
                GatewayError::Install(format!("fetch of {} failed: {}", request.url, e))
            })?;
            metrics::record_network_fetch(Some(response.status));
            if !response.is_ok() {
                return Err(GatewayError::Install(format!(
                    "{} answered {} {}",
                    request.url, response.status, response.status_text
                )));
            }
            debug!("Fetched manifest asset {}", request.url);
            Ok(CacheEntry::new(CacheKey::from_request(request), response))
        }))
        .await?;

        let cached = entries.len();
        self.cache().commit(entries).await?;
        Ok(cached)
    }

    /// Delete every stale generation and take control of open windows.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.inner
            .registration
            .lock()
            .transition(&[WorkerState::Installed], WorkerState::Activating)?;

        let generation = self.cache().current_generation().to_string();
        info!("Activating cache generation {}", generation);

        let deleted = match self.cache().sweep_stale().await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.inner.registration.lock().state = WorkerState::Installed;
                metrics::record_lifecycle("activate", false);
                return Err(e);
            }
        };

        let clients_claimed = match self.inner.host.claim(&generation).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to claim clients: {}", e);
                0
            }
        };

        self.inner.registration.lock().state = WorkerState::Activated;
        metrics::record_lifecycle("activate", true);
        info!(
            "Generation {} active; removed {} stale caches, claimed {} clients",
            generation,
            deleted.len(),
            clients_claimed
        );

        Ok(ActivationReport {
            generation,
            deleted,
            clients_claimed,
        })
    }
}

impl OfflineGateway {
    /// Install the current generation and activate it when skip-waiting is
    /// set, without ever failing.
    ///
    /// A failed install leaves older generations serving. A failed activation
    /// leaves the worker `Installed` so the new generation still answers and a
    /// later `SKIP_WAITING` message may retry the sweep.
    pub async fn start(&self) -> WorkerState {
        match self.install().await {
            Ok(report) => {
                info!("Cached {} assets in {}", report.cached, report.generation);
            }
            Err(e) => {
                error!("Install failed, continuing with existing caches: {}", e);
                return self.state();
            }
        }

        if self.skip_waiting_requested() {
            match self.activate().await {
                Ok(report) => info!("Removed stale generations: {:?}", report.deleted),
                Err(e) => error!("Activation failed, serving without sweeping: {}", e),
            }
        }
        self.state()
    }
}
