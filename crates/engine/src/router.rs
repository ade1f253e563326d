//! Request router.
//!
//! Classifies each request against an ordered table of routes and hands it
//! to the first matching route's strategy. Requests no route claims take the
//! generic route. Adding a request class means adding a row, not a branch.

use std::sync::Arc;

use pwacache_core::{AppConfig, ConfigError, MatcherConfig, Request, RequestKey, RouteConfig, StrategyKind};
use regex::Regex;
use url::{Origin, Url};

use crate::strategies::{CacheFirstWithFallback, NavigationFallback, NetworkFallbackOnMiss, RetrievalStrategy};

/// Class of requests no configured route claims.
pub const GENERIC_CLASS: &str = "generic";

/// Predicate over a request URL.
#[derive(Debug, Clone)]
pub enum RequestMatcher {
    Prefix(String),
    Origin(Origin),
    Pattern(Regex),
}

impl RequestMatcher {
    pub fn matches(&self, request: &Request) -> bool {
        match self {
            RequestMatcher::Prefix(prefix) => request.url.as_str().starts_with(prefix.as_str()),
            RequestMatcher::Origin(origin) => &request.url.origin() == origin,
            RequestMatcher::Pattern(re) => re.is_match(request.url.as_str()),
        }
    }

    pub fn from_config(config: &MatcherConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { field: "routes.matcher".into(), reason };
        match config {
            MatcherConfig::Prefix(prefix) => Ok(RequestMatcher::Prefix(prefix.clone())),
            MatcherConfig::Origin(origin) => {
                let url = Url::parse(origin).map_err(|e| invalid(format!("{origin}: {e}")))?;
                Ok(RequestMatcher::Origin(url.origin()))
            }
            MatcherConfig::Regex(pattern) => Regex::new(pattern)
                .map(RequestMatcher::Pattern)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

/// One row of the routing table.
pub struct Route {
    pub class: String,
    pub matcher: Option<RequestMatcher>,
    pub strategy: Arc<dyn RetrievalStrategy>,
}

impl Route {
    fn matches(&self, request: &Request) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.matches(request))
    }
}

pub struct Router {
    routes: Vec<Route>,
    generic: Route,
}

impl Router {
    /// A router that sends every request to `generic`.
    pub fn new(generic: Arc<dyn RetrievalStrategy>) -> Self {
        Self { routes: Vec::new(), generic: Route { class: GENERIC_CLASS.into(), matcher: None, strategy: generic } }
    }

    /// Append a route. Routes are checked in insertion order.
    pub fn with_route(
        mut self, class: impl Into<String>, matcher: RequestMatcher, strategy: Arc<dyn RetrievalStrategy>,
    ) -> Self {
        self.routes.push(Route { class: class.into(), matcher: Some(matcher), strategy });
        self
    }

    /// Build the routing table described by the configuration.
    ///
    /// The generic route uses the network-fallback strategy recovering
    /// navigations with `navigation_fallback`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let scope = config.scope_url()?;
        let key = |entry: &str, field: &str| {
            RequestKey::parse(entry, &scope)
                .map_err(|e| ConfigError::Invalid { field: field.to_string(), reason: e.to_string() })
        };

        let root = key(&config.navigation_fallback, "navigation_fallback")?;
        let mut router = Self::new(Arc::new(NetworkFallbackOnMiss::new(NavigationFallback::new(root.clone()))));

        for RouteConfig { class, matcher, strategy, fallback } in &config.routes {
            let fallback = fallback.as_deref().map(|f| key(f, "routes.fallback")).transpose()?;
            let strategy: Arc<dyn RetrievalStrategy> = match strategy {
                StrategyKind::CacheFirstWithRefresh => Arc::new(CacheFirstWithFallback::new(fallback)),
                StrategyKind::NetworkFallbackOnMiss => Arc::new(NetworkFallbackOnMiss::new(NavigationFallback::new(
                    fallback.unwrap_or_else(|| root.clone()),
                ))),
            };
            router = router.with_route(class.clone(), RequestMatcher::from_config(matcher)?, strategy);
        }

        Ok(router)
    }

    /// The route serving `request`.
    pub fn classify(&self, request: &Request) -> &Route {
        self.routes.iter().find(|route| route.matches(request)).unwrap_or(&self.generic)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().chain(std::iter::once(&self.generic)).map(|r| r.class.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{THUMBNAIL, scope, test_config};
    use pwacache_core::RequestMode;

    fn request(url: &str) -> Request {
        Request::get(url, &scope()).unwrap()
    }

    #[test]
    fn test_default_config_routes_thumbnails() {
        let router = Router::from_config(&test_config("v1")).unwrap();

        let route = router.classify(&request(THUMBNAIL).with_mode(RequestMode::NoCors));
        assert_eq!(route.class, "remote-asset");
        assert_eq!(route.strategy.name(), "cache-first-with-fallback");
    }

    #[test]
    fn test_everything_else_is_generic() {
        let router = Router::from_config(&test_config("v1")).unwrap();

        for url in ["/", "/index.html", "https://img.youtube.com/other/x.jpg", "https://cdn.tailwindcss.com"] {
            let route = router.classify(&request(url));
            assert_eq!(route.class, GENERIC_CLASS, "{url}");
            assert_eq!(route.strategy.name(), "network-fallback-on-miss");
        }
    }

    #[test]
    fn test_first_matching_route_wins() {
        let generic = Arc::new(CacheFirstWithFallback::new(None));
        let router = Router::new(generic.clone())
            .with_route("avatars", RequestMatcher::Pattern(Regex::new(r"/avatars/\d+\.png$").unwrap()), generic.clone())
            .with_route(
                "cdn",
                RequestMatcher::Origin(Url::parse("https://cdn.example.com").unwrap().origin()),
                generic.clone(),
            );

        assert_eq!(router.classify(&request("https://cdn.example.com/avatars/7.png")).class, "avatars");
        assert_eq!(router.classify(&request("https://cdn.example.com/app.css")).class, "cdn");
        assert_eq!(router.classify(&request("https://cdn.example.org/app.css")).class, GENERIC_CLASS);
    }

    #[test]
    fn test_classes_listed_in_order() {
        let router = Router::from_config(&test_config("v1")).unwrap();
        assert_eq!(router.classes().collect::<Vec<_>>(), vec!["remote-asset", GENERIC_CLASS]);
    }

    #[test]
    fn test_matcher_from_config() {
        let m = RequestMatcher::from_config(&MatcherConfig::Origin("https://img.youtube.com".into())).unwrap();
        assert!(m.matches(&request(THUMBNAIL)));

        let result = RequestMatcher::from_config(&MatcherConfig::Regex("[".into()));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
