//! Install/activate state machine.
//!
//! `Installing -> Installed -> Activating -> Active`. A failed install stays
//! in `Installing` and may be retried; activation is only accepted once the
//! generation is installed. Once `Active`, repeated triggers re-run their
//! side effects without leaving `Active`, so in-flight requests stay
//! controlled.
//!
//! Activation is persisted with the store, so a controller built over a
//! store whose generation already activated can [`resume`] straight into
//! `Active` without touching the network.
//!
//! [`resume`]: LifecycleController::resume

use std::fmt;
use std::sync::Arc;

use pwacache_core::GenerationId;
use tokio::sync::{Mutex, RwLock};

use crate::error::EngineError;
use crate::manager::VersionedCacheManager;
use crate::manifest::PrecacheManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    Installed,
    Activating,
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        })
    }
}

/// What the host runtime should do after a lifecycle trigger succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Supersede the previously controlling version now instead of waiting
    /// for all its clients to close.
    SkipWaiting,
    /// Take control of every open client now instead of at its next
    /// navigation.
    ClaimClients,
}

/// Drives one generation from installation to control.
pub struct LifecycleController {
    generation: GenerationId,
    manifest: PrecacheManifest,
    manager: Arc<VersionedCacheManager>,
    state: RwLock<LifecycleState>,
    // Serializes install and activate so their phases never interleave.
    transition: Mutex<()>,
}

impl LifecycleController {
    pub fn new(
        generation: GenerationId,
        manifest: PrecacheManifest,
        manager: Arc<VersionedCacheManager>,
    ) -> Self {
        Self {
            generation,
            manifest,
            manager,
            state: RwLock::new(LifecycleState::Installing),
            transition: Mutex::new(()),
        }
    }

    pub fn generation(&self) -> &GenerationId {
        &self.generation
    }

    pub fn manifest(&self) -> &PrecacheManifest {
        &self.manifest
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Whether this generation owns traffic.
    pub async fn is_controlling(&self) -> bool {
        self.state().await == LifecycleState::Active
    }

    async fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.write().await;
        let from = *state;
        tracing::debug!(generation = %self.generation, %from, to = %next, "lifecycle transition");
        *state = next;
    }

    /// Populate the generation's store from the manifest.
    ///
    /// On success the generation is `Installed` and should replace the
    /// previous version immediately.
    pub async fn install(&self) -> Result<LifecycleSignal, EngineError> {
        let _guard = self.transition.lock().await;
        let active = self.state().await == LifecycleState::Active;
        if !active {
            self.set_state(LifecycleState::Installing).await;
        }

        if let Err(e) = self.manager.populate(&self.generation, &self.manifest).await {
            tracing::warn!(generation = %self.generation, error = %e, "install failed");
            return Err(e.into());
        }

        if !active {
            self.set_state(LifecycleState::Installed).await;
        }
        tracing::info!(generation = %self.generation, "installed");
        Ok(LifecycleSignal::SkipWaiting)
    }

    /// Pick up a generation that activated in an earlier run.
    ///
    /// Returns true when the generation is (now) `Active`. Nothing is
    /// fetched or deleted; a generation never activated before stays where
    /// it is and must go through install and activate.
    pub async fn resume(&self) -> Result<bool, EngineError> {
        let _guard = self.transition.lock().await;
        if self.state().await == LifecycleState::Active {
            return Ok(true);
        }
        if !self.manager.is_activated(&self.generation).await? {
            return Ok(false);
        }

        self.set_state(LifecycleState::Active).await;
        tracing::info!(generation = %self.generation, "resumed active generation");
        Ok(true)
    }

    /// Retire every other generation and take control.
    pub async fn activate(&self) -> Result<LifecycleSignal, EngineError> {
        let _guard = self.transition.lock().await;
        let current = self.state().await;
        if current == LifecycleState::Installing {
            return Err(EngineError::NotInstalled(self.generation.clone()));
        }

        if current != LifecycleState::Active {
            self.set_state(LifecycleState::Activating).await;
        }

        let deleted = self.manager.reclaim_stale(&self.generation).await;
        if let Err(e) = self.manager.mark_activated(&self.generation).await {
            tracing::warn!(generation = %self.generation, error = %e, "could not persist activation");
        }

        self.set_state(LifecycleState::Active).await;
        tracing::info!(generation = %self.generation, reclaimed = deleted.len(), "activated");
        Ok(LifecycleSignal::ClaimClients)
    }
}
