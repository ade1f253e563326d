//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use thiserror::Error;

use crate::config::{AppConfig, MatcherConfig};
use crate::request::RequestKey;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `generation` or `user_agent` is empty
    /// - `scope` is not an absolute http(s) URL
    /// - a precache entry cannot be resolved against the scope
    /// - the navigation fallback or a route fallback is not precached
    /// - a route has an empty class or pattern, a duplicate class, or a bad regex
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_redirects` exceeds 20
    ///
    /// Returns `ConfigError::Missing` if `precache` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.trim().is_empty() {
            return Err(invalid("generation", "must not be empty"));
        }

        let scope = self.scope_url()?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(invalid("scope", "must be an http or https URL"));
        }

        if self.precache.is_empty() {
            return Err(ConfigError::Missing {
                field: "precache".into(),
                hint: "list at least the application entry point".into(),
            });
        }

        let mut precached = HashSet::new();
        for entry in &self.precache {
            let key = RequestKey::parse(entry, &scope).map_err(|e| invalid("precache", format!("{entry}: {e}")))?;
            precached.insert(key);
        }

        let is_precached = |entry: &str| RequestKey::parse(entry, &scope).is_ok_and(|key| precached.contains(&key));

        if !is_precached(&self.navigation_fallback) {
            return Err(invalid(
                "navigation_fallback",
                format!("{} must be listed in precache", self.navigation_fallback),
            ));
        }

        let mut classes = HashSet::new();
        for route in &self.routes {
            if route.class.trim().is_empty() {
                return Err(invalid("routes.class", "must not be empty"));
            }
            if route.class == "generic" || !classes.insert(route.class.as_str()) {
                return Err(invalid("routes.class", format!("duplicate class {}", route.class)));
            }

            match &route.matcher {
                MatcherConfig::Prefix(p) | MatcherConfig::Origin(p) if p.is_empty() => {
                    return Err(invalid("routes.matcher", format!("{}: pattern must not be empty", route.class)));
                }
                MatcherConfig::Origin(origin) => {
                    url::Url::parse(origin).map_err(|e| invalid("routes.matcher", format!("{origin}: {e}")))?;
                }
                MatcherConfig::Regex(pattern) => {
                    regex::Regex::new(pattern).map_err(|e| invalid("routes.matcher", e.to_string()))?;
                }
                MatcherConfig::Prefix(_) => {}
            }

            if let Some(fallback) = &route.fallback
                && !is_precached(fallback)
            {
                return Err(invalid("routes.fallback", format!("{fallback} must be listed in precache")));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_redirects > 20 {
            return Err(invalid("max_redirects", "must not exceed 20"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.routes.is_empty() {
            tracing::debug!("no routes configured; every request takes the generic route");
        }

        Ok(())
    }
}
