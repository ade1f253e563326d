//! Entry points invoked by the host runtime.

use std::sync::Arc;

use pwacache_core::{AppConfig, CacheStorage, Fetcher, NetworkFailure, Request, Response};
use url::Url;

use crate::error::EngineError;
use crate::lifecycle::{LifecycleController, LifecycleSignal};
use crate::manager::VersionedCacheManager;
use crate::manifest::PrecacheManifest;
use crate::router::Router;
use crate::strategies::StrategyContext;

/// The whole surface the caching core exposes to its host.
#[async_trait::async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Populate the current generation. Host should skip waiting on success.
    async fn on_install(&self) -> Result<LifecycleSignal, EngineError>;

    /// Retire stale generations. Host should claim clients on success.
    async fn on_activate(&self) -> Result<LifecycleSignal, EngineError>;

    /// Answer one intercepted request.
    async fn on_fetch(&self, request: &Request) -> Result<Response, NetworkFailure>;
}

/// Policy engine over a cache storage and a fetcher.
pub struct CachePolicyEngine {
    lifecycle: LifecycleController,
    manager: Arc<VersionedCacheManager>,
    router: Router,
    fetcher: Arc<dyn Fetcher>,
}

impl CachePolicyEngine {
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let scope = config.scope_url()?;
        let manager = Arc::new(VersionedCacheManager::new(storage, fetcher.clone(), scope));
        let lifecycle = LifecycleController::new(
            config.generation_id(),
            PrecacheManifest::new(config.precache.iter().cloned()),
            manager.clone(),
        );
        let router = Router::from_config(config)?;

        Ok(Self { lifecycle, manager, router, fetcher })
    }

    /// Take control again if this generation activated in an earlier run.
    ///
    /// Returns false when the host still has to install and activate.
    pub async fn resume(&self) -> Result<bool, EngineError> {
        self.lifecycle.resume().await
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn manager(&self) -> &VersionedCacheManager {
        &self.manager
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn scope(&self) -> &Url {
        self.manager.scope()
    }

    async fn passthrough(&self, request: &Request, reason: &'static str) -> Result<Response, NetworkFailure> {
        tracing::debug!(url = %request.url, method = %request.method, reason, "passing request through");
        self.fetcher.fetch(request).await
    }
}

#[async_trait::async_trait]
impl PolicyEngine for CachePolicyEngine {
    async fn on_install(&self) -> Result<LifecycleSignal, EngineError> {
        self.lifecycle.install().await
    }

    async fn on_activate(&self) -> Result<LifecycleSignal, EngineError> {
        self.lifecycle.activate().await
    }

    async fn on_fetch(&self, request: &Request) -> Result<Response, NetworkFailure> {
        if !request.is_cacheable_method() {
            return self.passthrough(request, "method").await;
        }
        if !self.lifecycle.is_controlling().await {
            return self.passthrough(request, "not controlling").await;
        }

        let store = match self.manager.get_active(self.lifecycle.generation()).await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "active cache store unavailable");
                return self.passthrough(request, "store unavailable").await;
            }
        };

        let route = self.router.classify(request);
        tracing::debug!(
            url = %request.url,
            class = %route.class,
            strategy = route.strategy.name(),
            "routing request"
        );

        let ctx = StrategyContext { store: store.as_ref(), fetcher: self.fetcher.as_ref() };
        route.strategy.respond(request, &ctx).await
    }
}
