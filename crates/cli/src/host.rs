//! Wiring between configuration, storage, network and the engine.

use std::sync::Arc;

use anyhow::{Context, Result};
use pwacache_client::{FetchConfig, HttpFetcher};
use pwacache_core::{AppConfig, CacheDb};
use pwacache_engine::CachePolicyEngine;

/// Everything a command needs: the engine and direct store access.
pub struct Host {
    pub config: AppConfig,
    pub db: CacheDb,
    pub engine: CachePolicyEngine,
}

impl Host {
    /// Load configuration and open the store database.
    pub async fn start() -> Result<Self> {
        let config = AppConfig::load().context("loading configuration")?;
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let db = CacheDb::open(&config.db_path)
            .await
            .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
        let fetcher = HttpFetcher::new(FetchConfig::from_app_config(&config)?)?;
        let engine = CachePolicyEngine::new(&config, Arc::new(db.clone()), Arc::new(fetcher))?;

        tracing::info!(
            generation = %config.generation,
            scope = %config.scope,
            db_path = %config.db_path.display(),
            "host ready"
        );

        Ok(Self { config, db, engine })
    }
}
