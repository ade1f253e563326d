//! URL canonicalization for consistent request identity.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string relative to the controlled scope.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references (`/index.html`, `icons/a.png`) against `base`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str, base: &url::Url) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        }
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &url::Url, b: &url::Url) -> bool {
    a.origin() == b.origin()
}
