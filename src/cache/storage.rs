//! Named cache buckets.
//!
//! Buckets are shared between controller versions through a cloned
//! [`CacheStorage`] handle, the way every worker generation of one origin
//! sees the same `caches` object. Writes to a bucket are last-put-wins and
//! never span more than one key.

use super::request::{Method, Request, Response};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use url::Url;

/// Entry key: method plus the full URL, query included, fragment dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    url: String,
}

impl CacheKey {
    pub fn new(request: &Request) -> Self {
        let mut url: Url = request.url.clone();
        url.set_fragment(None);
        Self {
            method: request.method,
            url: url.into(),
        }
    }
}

/// One named bucket of request → response snapshots.
#[derive(Debug)]
pub struct Cache {
    name: String,
    entries: RwLock<FxHashMap<CacheKey, Response>>,
}

impl Cache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for the request, if any.
    pub fn match_request(&self, request: &Request) -> Option<Response> {
        self.entries.read().get(&CacheKey::new(request)).cloned()
    }

    /// Store a response, replacing any previous one for the same key.
    pub fn put(&self, request: &Request, response: Response) {
        self.entries.write().insert(CacheKey::new(request), response);
    }

    /// Store several entries under one write lock.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (Request, Response)>) {
        let mut map = self.entries.write();
        for (request, response) in entries {
            map.insert(CacheKey::new(&request), response);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All buckets of one origin, in creation order.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    buckets: Arc<RwLock<Vec<Arc<Cache>>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a bucket, creating it if it does not exist yet.
    pub fn open(&self, name: &str) -> Arc<Cache> {
        if let Some(cache) = self.get(name) {
            return cache;
        }
        let mut buckets = self.buckets.write();
        // Another opener may have raced us between the read and write lock
        if let Some(cache) = buckets.iter().find(|c| c.name == name) {
            return Arc::clone(cache);
        }
        let cache = Arc::new(Cache::new(name));
        buckets.push(Arc::clone(&cache));
        cache
    }

    pub fn get(&self, name: &str) -> Option<Arc<Cache>> {
        self.buckets
            .read()
            .iter()
            .find(|c| c.name == name)
            .map(Arc::clone)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bucket names in creation order.
    pub fn keys(&self) -> Vec<String> {
        self.buckets.read().iter().map(|c| c.name.clone()).collect()
    }

    /// Delete a whole bucket. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut buckets = self.buckets.write();
        let before = buckets.len();
        buckets.retain(|c| c.name != name);
        buckets.len() != before
    }

    /// Search every bucket, oldest first.
    pub fn match_any(&self, request: &Request) -> Option<Response> {
        self.buckets
            .read()
            .iter()
            .find_map(|cache| cache.match_request(request))
    }
}
