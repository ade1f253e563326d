//! Errors raised by the policy engine.

use std::fmt;

use pwacache_core::{ConfigError, GenerationId, NetworkFailure};

/// A manifest resource that could not be precached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFailure {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for ResourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.reason)
    }
}

/// Installation could not bring the generation's store to a populated state.
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    /// A manifest entry could not be resolved to a request.
    #[error("POPULATION_FAILED: invalid manifest entry: {0}")]
    InvalidEntry(String),

    /// One or more resources failed to fetch or returned a non-success status.
    #[error("POPULATION_FAILED: {} of {total} resources failed: {}", .failures.len(), join(.failures))]
    Fetch { failures: Vec<ResourceFailure>, total: usize },

    /// The store rejected the write.
    #[error("POPULATION_FAILED: {0}")]
    Store(#[from] pwacache_core::Error),
}

fn join(failures: &[ResourceFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Errors returned by the lifecycle entry points.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error("NOT_INSTALLED: generation {0} has not finished installing")]
    NotInstalled(GenerationId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] pwacache_core::Error),

    #[error(transparent)]
    Network(#[from] NetworkFailure),
}
