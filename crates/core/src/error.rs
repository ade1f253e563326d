//! Unified error types for pwa-cache.
//!
//! Display strings carry a stable code prefix so host adapters can match on
//! them without depending on the enum layout.

use tokio_rusqlite::rusqlite;

/// Errors raised by the cache store layer and request normalization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input (e.g., empty store name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded back into a snapshot.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

/// A network request that could not be completed.
///
/// Non-success HTTP statuses are not failures; they arrive as responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkFailure {
    /// The request URL could not be used.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The request method is not a valid HTTP token.
    #[error("INVALID_METHOD: {0}")]
    InvalidMethod(String),

    /// Could not connect to the remote host (offline, DNS, refused).
    #[error("NETWORK_OFFLINE: {0}")]
    Connect(String),

    /// Transport-level timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    Timeout(String),

    /// Response body exceeded the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    TooLarge(String),

    /// Any other transport failure.
    #[error("NETWORK_FAILURE: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("INVALID_URL"));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_network_failure_display() {
        let err = NetworkFailure::Connect("dns error".to_string());
        assert_eq!(err.to_string(), "NETWORK_OFFLINE: dns error");
    }

    #[test]
    fn test_rusqlite_error_maps_to_database() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }
}
