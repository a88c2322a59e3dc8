//! In-memory network for controller tests.

use super::{
    CacheError, Network,
    request::{Request, Response},
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Notify;

/// Answers from a route table, counts calls, and can go offline or be
/// held at a gate until the test releases it.
#[derive(Debug, Default)]
pub struct StubNetwork {
    routes: Mutex<FxHashMap<String, Vec<u8>>>,
    calls: AtomicUsize,
    offline: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, body: &str) -> Self {
        self.set_route(url, body);
        self
    }

    /// Hold every fetch until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_route(&self, url: &str, body: &str) {
        self.routes
            .lock()
            .insert(url.to_owned(), body.as_bytes().to_vec());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::NetworkFetchFailure {
                url: request.url.to_string(),
                reason: "offline".into(),
            });
        }

        let body = self.routes.lock().get(request.url.as_str()).cloned();
        Ok(match body {
            Some(body) => Response::new(200, body),
            None => Response::new(404, b"".as_slice()),
        })
    }
}
