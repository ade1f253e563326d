//! Incoming requests and their cache identity.

use sha2::{Digest, Sha256};
use url::Url;

use crate::Error;
use crate::normalize::canonicalize;

/// How the page issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Same-origin subresource.
    #[default]
    SameOrigin,
    /// Cross-origin request whose response the page may not read.
    NoCors,
    /// Cross-origin request with CORS.
    Cors,
}

/// A request intercepted from the controlled page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

impl Request {
    /// Build a `GET` request, resolving `url` against the controlled scope.
    pub fn get(url: &str, scope: &Url) -> Result<Self, Error> {
        let url = canonicalize(url, scope).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { method: "GET".into(), url, mode: RequestMode::SameOrigin })
    }

    /// Build a top-level navigation request.
    pub fn navigate(url: &str, scope: &Url) -> Result<Self, Error> {
        Ok(Self::get(url, scope)?.with_mode(RequestMode::Navigate))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Only `GET` requests can be looked up in or written to a cache store.
    pub fn is_cacheable_method(&self) -> bool {
        self.method == "GET"
    }

    /// Cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.url)
    }
}

/// Request identity inside a cache store: `GET` plus the canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(url: &Url) -> Self {
        Self { method: "GET".into(), url: url.to_string() }
    }

    /// Resolve a manifest entry (absolute or scope-relative) to its key.
    pub fn parse(url: &str, scope: &Url) -> Result<Self, Error> {
        let url = canonicalize(url, scope).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(&url))
    }

    /// Stable hex digest used as the storage key.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    #[test]
    fn test_digest_stability() {
        let a = RequestKey::parse("/index.html", &scope()).unwrap();
        let b = RequestKey::parse("http://LOCALHOST:8080/index.html#x", &scope()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_format() {
        let key = RequestKey::parse("/", &scope()).unwrap();
        let digest = key.digest();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_differs_by_query() {
        let a = RequestKey::parse("/a?x=1", &scope()).unwrap();
        let b = RequestKey::parse("/a?x=2", &scope()).unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_request_key_ignores_method() {
        let request = Request::get("/api/save", &scope()).unwrap().with_method("post");
        assert_eq!(request.method, "POST");
        assert!(!request.is_cacheable_method());
        assert_eq!(request.key().method, "GET");
    }

    #[test]
    fn test_navigate_mode() {
        let request = Request::navigate("/workouts", &scope()).unwrap();
        assert!(request.is_navigation());
        assert_eq!(request.url.as_str(), "http://localhost:8080/workouts");
    }

    #[test]
    fn test_invalid_url() {
        let result = Request::get("ftp://example.com/file", &scope());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
