//! The network capability consumed by the policy engine.

use crate::error::NetworkFailure;
use crate::request::Request;
use crate::response::Response;

/// Performs a network request.
///
/// Implementations return every completed exchange as a [`Response`],
/// whatever its status; only transport problems are failures.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkFailure>;
}
