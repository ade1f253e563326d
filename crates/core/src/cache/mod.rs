//! SQLite-backed cache stores for response snapshots.
//!
//! This module provides the key-addressable cache store capability and a
//! persistent implementation using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Named stores, one per generation, deleted as a whole
//! - Entries keyed by the SHA-256 digest of the request identity
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod migrations;
pub mod snapshots;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use snapshots::Snapshot;
pub use storage::{CacheStorage, CacheStore, SqliteStore};
