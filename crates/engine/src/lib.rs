//! Caching policy engine for an offline-capable single-page application.
//!
//! The engine decides, per intercepted request, whether to answer from the
//! active cache generation, go to the network, or fall back to a precached
//! asset. It also sequences the install/activate lifecycle that populates a
//! new generation and retires the old ones.
//!
//! The host runtime drives everything through [`PolicyEngine`]:
//!
//! - [`PolicyEngine::on_install`] populates the generation's store
//! - [`PolicyEngine::on_activate`] deletes superseded stores
//! - [`PolicyEngine::on_fetch`] routes a request to its retrieval strategy

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod manifest;
pub mod router;
pub mod strategies;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{CachePolicyEngine, PolicyEngine};
pub use error::{EngineError, PopulationError, ResourceFailure};
pub use lifecycle::{LifecycleController, LifecycleSignal, LifecycleState};
pub use manager::VersionedCacheManager;
pub use manifest::PrecacheManifest;
pub use router::{GENERIC_CLASS, RequestMatcher, Route, Router};
pub use strategies::{
    CacheFirstWithFallback, NavigationFallback, NetworkFallbackOnMiss, RetrievalStrategy, StrategyContext,
};
