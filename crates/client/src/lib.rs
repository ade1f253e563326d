//! Client code for pwa-cache.
//!
//! This crate provides the HTTP implementation of the `Fetcher` capability
//! used by the policy engine and the command-line host.

pub mod fetch;

pub use fetch::{FetchConfig, HttpFetcher, response_kind};
