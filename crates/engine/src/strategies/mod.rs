//! Retrieval strategies.
//!
//! A strategy turns one request into a response using the active store and
//! the network. Store problems never fail a request: a failed read counts as
//! a miss and a failed write is logged while the network response is still
//! returned.

mod cache_first;
mod navigation;
mod network_fallback;

pub use cache_first::CacheFirstWithFallback;
pub use navigation::NavigationFallback;
pub use network_fallback::NetworkFallbackOnMiss;

use pwacache_core::{CacheStore, Fetcher, NetworkFailure, Request, RequestKey, Response, Snapshot};

/// What a strategy may touch while answering a request.
pub struct StrategyContext<'a> {
    pub store: &'a dyn CacheStore,
    pub fetcher: &'a dyn Fetcher,
}

/// Decision procedure producing a response for one request.
#[async_trait::async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn respond(&self, request: &Request, ctx: &StrategyContext<'_>) -> Result<Response, NetworkFailure>;
}

/// Read an entry, treating store errors as a miss.
pub(crate) async fn lookup(store: &dyn CacheStore, key: &RequestKey) -> Option<Snapshot> {
    match store.get(key).await {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(store = store.name(), url = %key.url, error = %e, "cache read failed; treating as miss");
            None
        }
    }
}

/// Write an entry, logging and swallowing store errors.
pub(crate) async fn store_copy(store: &dyn CacheStore, key: &RequestKey, snapshot: &Snapshot) {
    if let Err(e) = store.put(key, snapshot).await {
        tracing::warn!(store = store.name(), url = %key.url, error = %e, "cache write failed");
    }
}
