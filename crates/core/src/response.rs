//! Consume-once responses.
//!
//! A [`Response`] owns its body and hands it out exactly once through
//! [`Response::into_body`]. Anything that needs to keep a copy (the cache
//! stores) must take a [`Snapshot`] first via [`Response::snapshot`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Snapshot;

/// Response type as a browser would classify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response.
    Basic,
    /// Cross-origin response readable through CORS.
    Cors,
    /// Cross-origin `no-cors` response: status 0, no headers, no body.
    Opaque,
    /// Synthesized network error.
    Error,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
            ResponseKind::Opaque => "opaque",
            ResponseKind::Error => "error",
        }
    }
}

impl std::str::FromStr for ResponseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseKind::Basic),
            "cors" => Ok(ResponseKind::Cors),
            "opaque" => Ok(ResponseKind::Opaque),
            "error" => Ok(ResponseKind::Error),
            other => Err(format!("unknown response kind: {other}")),
        }
    }
}

/// Where a response was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
        }
    }
}

/// A response whose body can be consumed at most once.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseKind,
    pub url: Option<Url>,
    pub headers: Vec<(String, String)>,
    pub source: ResponseSource,
    body: Bytes,
}

impl Response {
    /// A network response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            kind: ResponseKind::Basic,
            url: None,
            headers: Vec::new(),
            source: ResponseSource::Network,
            body: body.into(),
        }
    }

    /// An opaque cross-origin response.
    pub fn opaque(url: Url) -> Self {
        Self { url: Some(url), kind: ResponseKind::Opaque, ..Self::new(0, Bytes::new()) }
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub(crate) fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Status 200 exactly.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the response may be written to the cache by the generic
    /// strategy: status 200 and a same-origin basic response.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && self.kind == ResponseKind::Basic
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Duplicate this response into a durable snapshot without consuming it.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            url: self.url.as_ref().map(|u| u.to_string()),
            status: self.status,
            status_text: self.status_text.clone(),
            kind: self.kind,
            headers: self.headers.clone(),
            body: self.body.clone(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Consume the response, yielding its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cacheable_requires_ok_and_basic() {
        assert!(Response::new(200, "x").is_cacheable());
        assert!(!Response::new(404, "x").is_cacheable());
        assert!(!Response::new(204, "").is_cacheable());
        assert!(!Response::new(200, "x").with_kind(ResponseKind::Cors).is_cacheable());
    }

    #[test]
    fn test_opaque_response() {
        let url = Url::parse("https://cdn.tailwindcss.com/").unwrap();
        let response = Response::opaque(url);
        assert_eq!(response.status, 0);
        assert_eq!(response.kind, ResponseKind::Opaque);
        assert!(!response.is_cacheable());
        assert_eq!(response.content_length(), 0);
    }

    #[test]
    fn test_snapshot_leaves_response_usable() {
        let response = Response::new(200, "<html></html>").with_header("Content-Type", "text/html");
        let snapshot = response.snapshot();
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(response.into_body(), Bytes::from_static(b"<html></html>"));
        assert_eq!(snapshot.body, Bytes::from_static(b"<html></html>"));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response = Response::new(200, "").with_header("ETag", "\"abc\"");
        assert_eq!(response.header("etag"), Some("\"abc\""));
        assert_eq!(response.header("ETAG"), Some("\"abc\""));
    }
}
