//! Response cache for conditional requests.
//!
//! The collector stores, per endpoint key, the last ETag it saw together
//! with the body that ETag validated. On a subsequent fetch the ETag is
//! sent as `If-None-Match`; a 304 answer is then served from the cached
//! body. The backing store is abstract: the default is in-memory, but
//! anything key/value shaped can implement [`ResponseCache`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// A cached response body and the ETag that validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Opaque validator from the server's `ETag` header.
    pub etag: String,
    /// The raw body bytes the ETag corresponds to.
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(etag: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            etag: etag.into(),
            body,
        }
    }
}

/// Abstract key/value store for conditional-request bookkeeping.
///
/// Keys are `{owner}/{name}` for repository metadata and
/// `{owner}/{name}_{page}` for stargazer pages.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<CachedResponse>;
    async fn put(&self, key: &str, entry: CachedResponse);
    /// Drop a stale entry, forcing the next fetch to go out unconditionally.
    async fn invalidate(&self, key: &str);
}

/// In-memory [`ResponseCache`] backed by a `HashMap` under an async lock.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CachedResponse>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, entry: CachedResponse) {
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}
