//! Generation identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Names one cache epoch, and with it the cache store holding that epoch's
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GenerationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl PartialEq<str> for GenerationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
