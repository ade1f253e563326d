//! Precache manifest.

use pwacache_core::normalize::same_origin;
use pwacache_core::{Request, RequestMode};
use url::Url;

use crate::error::PopulationError;

/// Ordered list of resources stored when a generation installs.
///
/// Entries may be absolute or relative to the scope. Duplicates are
/// collapsed when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrecacheManifest {
    entries: Vec<String>,
}

impl PrecacheManifest {
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { entries: entries.into_iter().map(Into::into).collect() }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry to the request that populates it, in manifest
    /// order, without duplicates.
    ///
    /// Same-origin entries are plain same-origin requests; cross-origin ones
    /// are issued in CORS mode so their responses can be checked.
    pub fn requests(&self, scope: &Url) -> Result<Vec<Request>, PopulationError> {
        let mut requests: Vec<Request> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let request = Request::get(entry, scope).map_err(|e| PopulationError::InvalidEntry(e.to_string()))?;
            if requests.iter().any(|r| r.url == request.url) {
                continue;
            }
            let mode = if same_origin(scope, &request.url) { RequestMode::SameOrigin } else { RequestMode::Cors };
            requests.push(request.with_mode(mode));
        }
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    #[test]
    fn test_requests_resolve_and_dedupe() {
        let manifest = PrecacheManifest::new(["/", "/index.html", "index.html", "https://cdn.tailwindcss.com"]);
        let requests = manifest.requests(&scope()).unwrap();

        let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["http://localhost:8080/", "http://localhost:8080/index.html", "https://cdn.tailwindcss.com/"]
        );
        assert_eq!(requests[0].mode, RequestMode::SameOrigin);
        assert_eq!(requests[2].mode, RequestMode::Cors);
    }

    #[test]
    fn test_requests_invalid_entry() {
        let manifest = PrecacheManifest::new(["/", "data:text/plain,hello"]);
        let result = manifest.requests(&scope());
        assert!(matches!(result, Err(PopulationError::InvalidEntry(_))));
    }
}
