//! Core types and shared functionality for pwa-cache.
//!
//! This crate provides:
//! - Request, response and snapshot types
//! - Cache store capability traits with a SQLite backend
//! - The fetcher capability trait
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod generation;
pub mod request;
pub mod response;
pub mod normalize;

pub use cache::{CacheDb, CacheStorage, CacheStore, Snapshot};
pub use config::{AppConfig, ConfigError, MatcherConfig, RouteConfig, StrategyKind};
pub use error::{Error, NetworkFailure};
pub use fetch::Fetcher;
pub use generation::GenerationId;
pub use request::{Request, RequestKey, RequestMode};
pub use response::{Response, ResponseKind, ResponseSource};
