//! Fetch interception: choosing and running a strategy per request.

use super::{
    CacheController, Network, WorkerState,
    request::{Destination, Method, Request, RequestMode, Response},
    storage::Cache,
};
use crate::{config::CacheConfig, log};
use std::sync::Arc;
use url::Url;

/// Result of offering a request to the controller.
#[derive(Debug, PartialEq, Eq)]
pub enum Intercept {
    /// Not handled; the default network behaviour applies.
    Passthrough,
    /// Answered by a strategy. `None` means both cache and network came up
    /// empty and the caller sees a network error.
    Handled(Option<Response>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    /// Pick the strategy for a request, or `None` to let it through.
    pub fn select(config: &CacheConfig, scope: &Url, request: &Request) -> Option<Self> {
        if request.method != Method::Get || request.url.origin() != scope.origin() {
            return None;
        }
        if request.mode == RequestMode::Navigate {
            return Some(Self::NetworkFirst);
        }
        if config.destinations.contains(&request.destination) {
            return Some(Self::CacheFirst);
        }
        if request.url.path().starts_with(&config.revalidate_prefix) {
            return Some(Self::StaleWhileRevalidate);
        }
        None
    }
}

impl<N: Network> CacheController<N> {
    /// Offer a request to the controller.
    ///
    /// Only an activated controller intercepts anything.
    pub async fn handle_fetch(&self, request: Request) -> Intercept {
        if self.state() != WorkerState::Activated {
            return Intercept::Passthrough;
        }
        let Some(strategy) = Strategy::select(&self.config, &self.scope, &request) else {
            return Intercept::Passthrough;
        };

        let response = match strategy {
            Strategy::NetworkFirst => self.network_first(&request).await,
            Strategy::CacheFirst => self.cache_first(&request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        };
        Intercept::Handled(response)
    }

    /// Live page, or the cached fallback document when the network fails.
    async fn network_first(&self, request: &Request) -> Option<Response> {
        match self.network.fetch(request).await {
            Ok(response) => Some(response),
            Err(err) => {
                log!("cache"; "offline, serving {}: {err}", self.config.fallback);
                let fallback = Request::get(self.resolve(&self.config.fallback).ok()?);
                self.storage.match_any(&fallback)
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Option<Response> {
        let cache = self.storage.open(&self.bucket);
        if let Some(hit) = cache.match_request(request) {
            return Some(hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    cache.put(request, response.clone());
                }
                Some(response)
            }
            Err(err) => {
                log!("warn"; "{err}");
                None
            }
        }
    }

    async fn stale_while_revalidate(&self, request: Request) -> Option<Response> {
        let cache = self.storage.open(&self.bucket);
        let cached = cache.match_request(&request);

        let handle = tokio::spawn(revalidate(Arc::clone(&self.network), cache, request));
        if cached.is_some() {
            self.keep_alive(handle);
            return cached;
        }
        handle.await.ok().flatten()
    }
}

/// Fetch a fresh copy and store it if it is cacheable.
async fn revalidate<N: Network>(
    network: Arc<N>,
    cache: Arc<Cache>,
    request: Request,
) -> Option<Response> {
    let response = network.fetch(&request).await.ok()?;
    if response.is_cacheable() {
        cache.put(&request, response.clone());
    }
    Some(response)
}
