//! Versioned cache manager.
//!
//! Owns the mapping from a generation to its cache store. It is the only
//! component that creates or deletes whole stores; strategies read and write
//! entries inside the store it hands out.

use std::sync::Arc;

use futures_util::future::join_all;
use pwacache_core::{CacheStorage, CacheStore, Error, Fetcher, GenerationId};
use url::Url;

use crate::error::{PopulationError, ResourceFailure};
use crate::manifest::PrecacheManifest;

pub struct VersionedCacheManager {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    scope: Url,
}

impl VersionedCacheManager {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, scope: Url) -> Self {
        Self { storage, fetcher, scope }
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Fetch every manifest resource and store it in the generation's store.
    ///
    /// All resources are fetched concurrently. Nothing is written unless every
    /// fetch completed with a 2xx status; the writes then land in a single
    /// transaction. Re-running against an existing store overwrites entries
    /// with the same content.
    pub async fn populate(
        &self,
        generation: &GenerationId,
        manifest: &PrecacheManifest,
    ) -> Result<(), PopulationError> {
        let store = self.storage.open_store(generation.as_str()).await?;
        let requests = manifest.requests(&self.scope)?;
        let total = requests.len();

        let results = join_all(requests.iter().map(|request| self.fetcher.fetch(request))).await;

        let mut entries = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(response) if response.is_success() => entries.push((request.key(), response.snapshot())),
                Ok(response) => failures.push(ResourceFailure {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                }),
                Err(failure) => {
                    failures.push(ResourceFailure { url: request.url.to_string(), reason: failure.to_string() })
                }
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                generation = %generation,
                failed = failures.len(),
                total,
                "precache population failed"
            );
            return Err(PopulationError::Fetch { failures, total });
        }

        store.put_all(&entries).await?;

        tracing::info!(generation = %generation, entries = entries.len(), "precache populated");
        Ok(())
    }

    /// Delete every store other than the active generation's.
    ///
    /// Cleanup is best-effort: listing or deletion errors are logged and
    /// skipped. Returns the names that were actually deleted.
    pub async fn reclaim_stale(&self, active: &GenerationId) -> Vec<String> {
        let names = match self.storage.list_store_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list cache stores; skipping cleanup");
                return Vec::new();
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|name| name != active.as_str()) {
            match self.storage.delete_store(&name).await {
                Ok(true) => {
                    tracing::info!(store = %name, "deleted stale cache store");
                    deleted.push(name);
                }
                Ok(false) => tracing::debug!(store = %name, "stale cache store already gone"),
                Err(e) => tracing::warn!(store = %name, error = %e, "failed to delete stale cache store"),
            }
        }
        deleted
    }

    /// Open the generation's store, creating it if absent.
    pub async fn get_active(&self, generation: &GenerationId) -> Result<Arc<dyn CacheStore>, Error> {
        self.storage.open_store(generation.as_str()).await
    }

    /// Persist that `generation` now owns traffic.
    pub async fn mark_activated(&self, generation: &GenerationId) -> Result<bool, Error> {
        self.storage.mark_activated(generation.as_str()).await
    }

    /// Whether `generation` was activated by an earlier run.
    pub async fn is_activated(&self, generation: &GenerationId) -> Result<bool, Error> {
        self.storage.is_activated(generation.as_str()).await
    }

    /// Names of every store currently held.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.storage.list_store_names().await
    }
}
