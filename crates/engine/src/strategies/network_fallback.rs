use pwacache_core::{NetworkFailure, Request, Response};

use super::{NavigationFallback, RetrievalStrategy, StrategyContext, lookup, store_copy};

/// Cache first overall; on a miss go to the network and keep what is safe
/// to keep.
///
/// Only status-200 same-origin responses are stored. When the network fails,
/// navigations get the precached root document; other requests see the
/// failure.
#[derive(Debug, Clone)]
pub struct NetworkFallbackOnMiss {
    navigation: NavigationFallback,
}

impl NetworkFallbackOnMiss {
    pub fn new(navigation: NavigationFallback) -> Self {
        Self { navigation }
    }
}

#[async_trait::async_trait]
impl RetrievalStrategy for NetworkFallbackOnMiss {
    fn name(&self) -> &'static str {
        "network-fallback-on-miss"
    }

    async fn respond(&self, request: &Request, ctx: &StrategyContext<'_>) -> Result<Response, NetworkFailure> {
        let key = request.key();

        if let Some(snapshot) = lookup(ctx.store, &key).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(snapshot.to_response());
        }

        match ctx.fetcher.fetch(request).await {
            Ok(response) if response.is_cacheable() => {
                store_copy(ctx.store, &key, &response.snapshot()).await;
                Ok(response)
            }
            Ok(response) => {
                tracing::debug!(
                    url = %request.url,
                    status = response.status,
                    kind = response.kind.as_str(),
                    "response not cacheable"
                );
                Ok(response)
            }
            Err(failure) if request.is_navigation() => match self.navigation.recover(ctx.store).await {
                Some(page) => {
                    tracing::debug!(url = %request.url, error = %failure, "offline navigation, serving root document");
                    Ok(page)
                }
                None => Err(failure),
            },
            Err(failure) => Err(failure),
        }
    }
}
