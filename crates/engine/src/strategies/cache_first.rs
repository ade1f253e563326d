use pwacache_core::{NetworkFailure, Request, RequestKey, Response};

use super::{RetrievalStrategy, StrategyContext, lookup, store_copy};

/// Cache first, fill the cache on a miss, serve a placeholder when offline.
///
/// A hit never contacts the network. Any response the network returns on a
/// miss is stored as-is, opaque or not. On network failure the configured
/// fallback entry is served; if it is missing too, the failure surfaces.
#[derive(Debug, Clone)]
pub struct CacheFirstWithFallback {
    fallback: Option<RequestKey>,
}

impl CacheFirstWithFallback {
    pub fn new(fallback: Option<RequestKey>) -> Self {
        Self { fallback }
    }
}

#[async_trait::async_trait]
impl RetrievalStrategy for CacheFirstWithFallback {
    fn name(&self) -> &'static str {
        "cache-first-with-fallback"
    }

    async fn respond(&self, request: &Request, ctx: &StrategyContext<'_>) -> Result<Response, NetworkFailure> {
        let key = request.key();

        if let Some(snapshot) = lookup(ctx.store, &key).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(snapshot.to_response());
        }

        match ctx.fetcher.fetch(request).await {
            Ok(response) => {
                store_copy(ctx.store, &key, &response.snapshot()).await;
                Ok(response)
            }
            Err(failure) => {
                let Some(fallback) = &self.fallback else {
                    return Err(failure);
                };
                match lookup(ctx.store, fallback).await {
                    Some(snapshot) => {
                        tracing::debug!(
                            url = %request.url,
                            fallback = %fallback.url,
                            error = %failure,
                            "serving fallback"
                        );
                        Ok(snapshot.to_response())
                    }
                    None => {
                        tracing::warn!(
                            url = %request.url,
                            fallback = %fallback.url,
                            "fallback entry missing from cache"
                        );
                        Err(failure)
                    }
                }
            }
        }
    }
}
