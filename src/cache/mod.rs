//! Runtime cache controller.
//!
//! Models the service worker shipped with the site: one versioned bucket,
//! a precache manifest filled on install, wholesale eviction of older
//! buckets on activation, and a per-request strategy choice on fetch.
//!
//! # Lifecycle
//!
//! ```text
//! Parsed ──install()──► Installing ──► Installed ──activate()──► Activating ──► Activated
//!                                                                                  │
//!                                                                      supersede() ▼
//!                                                                              Redundant
//! ```
//!
//! Install always skips the waiting phase, so an installed controller can be
//! activated right away. A `SKIP_WAITING` message requests the same.
//!
//! # Strategies
//!
//! | Request                                  | Strategy                     |
//! |------------------------------------------|------------------------------|
//! | navigation                               | network first, cached root   |
//! | style / script / image / font            | cache first                  |
//! | path under `revalidate_prefix`           | stale while revalidate       |
//! | anything else, non-GET, cross-origin     | not intercepted              |

mod error;
mod network;
mod request;
mod storage;
mod strategy;
#[cfg(test)]
mod testing;

pub use error::{CacheError, PrecacheMiss};
pub use network::{DirectoryNetwork, Network};
pub use request::{Destination, Method, Request, RequestMode, Response, ResponseType};
pub use storage::{Cache, CacheStorage};
pub use strategy::{Intercept, Strategy};

use crate::{config::CacheConfig, log};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::task::JoinHandle;
use url::Url;

/// Message a page posts to activate a waiting controller immediately.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// What install managed to store.
#[derive(Debug, Default)]
pub struct InstallOutcome {
    pub stored: usize,
    pub missed: Vec<PrecacheMiss>,
}

pub struct CacheController<N> {
    config: CacheConfig,
    scope: Url,
    bucket: String,
    storage: CacheStorage,
    network: Arc<N>,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
    /// Background revalidations whose event lifetime is still extended.
    pending: Mutex<Vec<JoinHandle<Option<Response>>>>,
}

impl<N: Network> CacheController<N> {
    pub fn new(
        config: &CacheConfig,
        storage: CacheStorage,
        network: Arc<N>,
    ) -> Result<Self, CacheError> {
        let scope = Url::parse(&config.scope)
            .map_err(|err| CacheError::InvalidUrl(config.scope.clone(), err))?;

        Ok(Self {
            bucket: config.bucket_name(),
            config: config.clone(),
            scope,
            storage,
            network,
            state: Mutex::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Resolve a scope-relative path such as `./index.html`.
    pub fn resolve(&self, path: &str) -> Result<Url, CacheError> {
        self.scope
            .join(path)
            .map_err(|err| CacheError::InvalidUrl(path.to_owned(), err))
    }

    /// Move `from → to`, or report the state that made the move invalid.
    fn transition(
        &self,
        action: &'static str,
        from: WorkerState,
        to: WorkerState,
    ) -> Result<(), CacheError> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(CacheError::InvalidTransition {
                action,
                state: *state,
            });
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock() = state;
    }

    /// Open the version bucket and precache the manifest.
    ///
    /// A failed precache is logged and reported in the outcome; install
    /// itself still succeeds so the controller can activate.
    pub async fn install(&self) -> Result<InstallOutcome, CacheError> {
        self.transition("install", WorkerState::Parsed, WorkerState::Installing)?;

        let cache = self.storage.open(&self.bucket);
        let outcome = match self.precache(&cache).await {
            Ok(stored) => InstallOutcome {
                stored,
                missed: Vec::new(),
            },
            Err(CacheError::PrecacheAssetFailure { failed, total }) => {
                log!("warn"; "precache failed for {} of {} assets", failed.len(), total);
                for miss in &failed {
                    log!("warn"; "{}: {}", miss.url, miss.reason);
                }
                InstallOutcome {
                    stored: 0,
                    missed: failed,
                }
            }
            Err(err) => {
                self.set_state(WorkerState::Parsed);
                return Err(err);
            }
        };

        self.set_state(WorkerState::Installed);
        self.skip_waiting();
        log!("cache"; "installed {} ({} precached)", cache.name(), outcome.stored);
        Ok(outcome)
    }

    /// Fetch every manifest entry, then store them all or none.
    async fn precache(&self, cache: &Cache) -> Result<usize, CacheError> {
        let total = self.config.precache.len();
        let mut fetched = Vec::with_capacity(total);
        let mut failed = Vec::new();

        for path in &self.config.precache {
            let url = self.resolve(path)?;
            let request = Request::get(url);
            match self.network.fetch(&request).await {
                Ok(response) if response.ok() => fetched.push((request, response)),
                Ok(response) => failed.push(PrecacheMiss {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                }),
                Err(err) => failed.push(PrecacheMiss {
                    url: request.url.to_string(),
                    reason: err.to_string(),
                }),
            }
        }

        if !failed.is_empty() {
            return Err(CacheError::PrecacheAssetFailure { failed, total });
        }
        cache.put_all(fetched);
        Ok(total)
    }

    /// Let an installed controller activate without waiting for old clients.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    /// Handle a message posted by a page. Returns whether it was understood.
    pub fn handle_message(&self, message: &str) -> bool {
        if message == SKIP_WAITING {
            self.skip_waiting();
            true
        } else {
            false
        }
    }

    /// Delete every bucket but the current one, then claim open pages.
    ///
    /// Returns the names of the deleted buckets.
    pub async fn activate(&self) -> Result<Vec<String>, CacheError> {
        if !self.skip_waiting.load(Ordering::SeqCst) {
            return Err(CacheError::InvalidTransition {
                action: "activate",
                state: self.state(),
            });
        }
        self.transition("activate", WorkerState::Installed, WorkerState::Activating)?;

        let stale: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| *name != self.bucket)
            .collect();
        for name in &stale {
            self.storage.delete(name);
            log!("cache"; "evicted {}", name);
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        self.set_state(WorkerState::Activated);
        Ok(stale)
    }

    /// Mark this controller as replaced by a newer version.
    pub fn supersede(&self) {
        self.set_state(WorkerState::Redundant);
    }

    /// Keep a background task alive until [`settle`](Self::settle).
    ///
    /// Handles of refreshes that already finished are dropped here, so the
    /// list only holds work that is still in flight.
    fn keep_alive(&self, handle: JoinHandle<Option<Response>>) {
        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every background revalidation to finish.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            if let Err(err) = handle.await {
                log!("warn"; "revalidation task failed: {err}");
            }
        }
    }
}
