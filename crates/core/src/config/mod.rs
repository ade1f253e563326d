//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PWA_CACHE_*)
//! 2. TOML config file (if PWA_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::GenerationId;

mod validation;

pub use validation::ConfigError;

/// Placeholder served when a video thumbnail cannot be fetched.
pub const THUMBNAIL_PLACEHOLDER: &str = "https://placehold.co/120x90/cccccc/ffffff?text=No+Video";

/// Retrieval strategy a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Serve from cache, otherwise fetch and store; on network failure serve
    /// the route's fallback entry.
    CacheFirstWithRefresh,
    /// Serve from cache, otherwise fetch and store cacheable responses; on
    /// network failure recover navigations with the root document.
    NetworkFallbackOnMiss,
}

/// How a route recognizes its requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherConfig {
    /// Request URL starts with this string.
    Prefix(String),
    /// Request URL has this origin (`scheme://host[:port]`).
    Origin(String),
    /// Request URL matches this regular expression.
    Regex(String),
}

/// One entry of the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Request class name, used in logs.
    pub class: String,
    pub matcher: MatcherConfig,
    pub strategy: StrategyKind,
    /// Precached entry served when the network fails.
    #[serde(default)]
    pub fallback: Option<String>,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PWA_CACHE_*)
/// 2. TOML config file (if PWA_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache generation name. Bump it to ship a new precache.
    ///
    /// Set via PWA_CACHE_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Origin and base path of the controlled application.
    ///
    /// Set via PWA_CACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Resources fetched and stored at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Precached document served to navigations when offline.
    ///
    /// Set via PWA_CACHE_NAVIGATION_FALLBACK environment variable.
    #[serde(default = "default_navigation_fallback")]
    pub navigation_fallback: String,

    /// Routing table, checked in order before the generic route.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Path to SQLite cache database.
    ///
    /// Set via PWA_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PWA_CACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via PWA_CACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PWA_CACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    ///
    /// Set via PWA_CACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_generation() -> String {
    "workout-app-cache-v1".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "https://cdn.tailwindcss.com",
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap",
        "https://placehold.co/192x192/87CEEB/87CEEB",
        "https://placehold.co/32x32/87CEEB/87CEEB",
        THUMBNAIL_PLACEHOLDER,
        "/icons/icon-72x72.png",
        "/icons/icon-96x96.png",
        "/icons/icon-128x128.png",
        "/icons/icon-144x144.png",
        "/icons/icon-152x152.png",
        "/icons/icon-192x192.png",
        "/icons/icon-384x384.png",
        "/icons/icon-512x512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_navigation_fallback() -> String {
    "/index.html".into()
}

fn default_routes() -> Vec<RouteConfig> {
    vec![RouteConfig {
        class: "remote-asset".into(),
        matcher: MatcherConfig::Prefix("https://img.youtube.com/vi/".into()),
        strategy: StrategyKind::CacheFirstWithRefresh,
        fallback: Some(THUMBNAIL_PLACEHOLDER.into()),
    }]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pwa-cache.sqlite")
}

fn default_user_agent() -> String {
    "pwa-cache/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            scope: default_scope(),
            precache: default_precache(),
            navigation_fallback: default_navigation_fallback(),
            routes: default_routes(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn generation_id(&self) -> GenerationId {
        GenerationId::new(self.generation.clone())
    }

    /// Parsed scope URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope is not an absolute URL.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PWA_CACHE_`
    /// 2. TOML file from `PWA_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PWA_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PWA_CACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.generation, "workout-app-cache-v1");
        assert_eq!(config.scope, "http://localhost:8080/");
        assert_eq!(config.precache.len(), 16);
        assert_eq!(config.navigation_fallback, "/index.html");
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].strategy, StrategyKind::CacheFirstWithRefresh);
        assert_eq!(config.db_path, PathBuf::from("./pwa-cache.sqlite"));
        assert_eq!(config.user_agent, "pwa-cache/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_scope_url() {
        let config = AppConfig::default();
        assert_eq!(config.scope_url().unwrap().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "pwa-cache.toml",
                r#"
                generation = "v7"
                precache = ["/", "/index.html", "/offline.png"]

                [[routes]]
                class = "avatars"
                matcher = { prefix = "https://avatars.example.com/" }
                strategy = "cache_first_with_refresh"
                fallback = "/offline.png"
                "#,
            )?;
            jail.set_env("PWA_CACHE_CONFIG_FILE", "pwa-cache.toml");
            jail.set_env("PWA_CACHE_TIMEOUT_MS", "5000");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.generation, "v7");
            assert_eq!(config.timeout_ms, 5000);
            assert_eq!(config.routes.len(), 1);
            assert_eq!(config.routes[0].matcher, MatcherConfig::Prefix("https://avatars.example.com/".into()));
            Ok(())
        });
    }
}
