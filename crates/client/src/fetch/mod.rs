//! HTTP fetch pipeline.
//!
//! ### Responses
//! - Every completed exchange is a response, including 4xx/5xx.
//! - Bodies are fully buffered so they can be snapshotted.
//! - Max body bytes: 10MB (configurable)
//! - Max redirects: 5
//!
//! ### Response kinds
//! - Final URL same-origin with the scope: `basic`
//! - Cross-origin `no-cors` request: `opaque` (status 0, no headers, no body)
//! - Any other cross-origin response: `cors`

use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use url::Url;

use pwacache_core::normalize::same_origin;
use pwacache_core::{AppConfig, ConfigError, Fetcher, NetworkFailure, Request, RequestMode, Response, ResponseKind};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin of the controlled application, used to classify responses.
    pub scope: Url,

    /// User agent string (default: "pwa-cache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Derive the fetch settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            scope: config.scope_url()?,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        })
    }
}

/// Classify a response the way a browser would for the page in `scope`.
pub fn response_kind(scope: &Url, mode: RequestMode, final_url: &Url) -> ResponseKind {
    if same_origin(scope, final_url) {
        ResponseKind::Basic
    } else if mode == RequestMode::NoCors {
        ResponseKind::Opaque
    } else {
        ResponseKind::Cors
    }
}

fn request_method(method: &str) -> Result<Method, NetworkFailure> {
    Method::from_bytes(method.as_bytes()).map_err(|e| NetworkFailure::InvalidMethod(format!("{method}: {e}")))
}

fn classify_error(err: &reqwest::Error) -> NetworkFailure {
    if err.is_timeout() {
        NetworkFailure::Timeout(err.to_string())
    } else if err.is_connect() {
        NetworkFailure::Connect(err.to_string())
    } else {
        NetworkFailure::Transport(err.to_string())
    }
}

/// HTTP fetcher backed by reqwest.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, NetworkFailure> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| NetworkFailure::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkFailure> {
        let start = Instant::now();
        let method = request_method(&request.method)?;

        let response = self
            .http
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let kind = response_kind(&self.config.scope, request.mode, &final_url);

        if kind == ResponseKind::Opaque {
            tracing::debug!(url = %request.url, "opaque response, body discarded");
            return Ok(Response::opaque(final_url));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(NetworkFailure::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(|e| classify_error(&e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(NetworkFailure::TooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            kind = kind.as_str(),
            bytes = bytes.len(),
            fetch_ms,
            "fetched"
        );

        let mut out = Response::new(status.as_u16(), bytes)
            .with_kind(kind)
            .with_url(final_url)
            .with_status_text(status.canonical_reason().unwrap_or_default());
        out.headers = headers;
        Ok(out)
    }
}
