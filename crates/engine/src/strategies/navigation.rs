use pwacache_core::{CacheStore, RequestKey, Response};

use super::lookup;

/// Recovery page for navigations that could not reach the network.
#[derive(Debug, Clone)]
pub struct NavigationFallback {
    document: RequestKey,
}

impl NavigationFallback {
    pub fn new(document: RequestKey) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &RequestKey {
        &self.document
    }

    /// The precached root document, if the store holds it.
    pub async fn recover(&self, store: &dyn CacheStore) -> Option<Response> {
        lookup(store, &self.document).await.map(|snapshot| snapshot.to_response())
    }
}
