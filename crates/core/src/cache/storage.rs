//! Cache store capability traits and their SQLite implementation.
//!
//! [`CacheStorage`] manages whole named stores; [`CacheStore`] reads and
//! writes entries inside one of them. The policy engine only talks to these
//! traits, so any key-addressable backend can stand in for SQLite.

use std::sync::Arc;

use super::connection::CacheDb;
use super::snapshots::Snapshot;
use crate::Error;
use crate::request::RequestKey;

/// Owner of every named cache store.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the named store, creating it if absent.
    async fn open_store(&self, name: &str) -> Result<Arc<dyn CacheStore>, Error>;

    /// Whether the named store exists.
    async fn has_store(&self, name: &str) -> Result<bool, Error>;

    /// Names of all stores.
    async fn list_store_names(&self) -> Result<Vec<String>, Error>;

    /// Delete the named store. Deleting an absent store returns `Ok(false)`.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    /// Durably record that the named store's generation took control.
    async fn mark_activated(&self, name: &str) -> Result<bool, Error>;

    /// Whether the named store's generation has taken control before.
    async fn is_activated(&self, name: &str) -> Result<bool, Error>;
}

/// A single key-addressable store of response snapshots.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &RequestKey) -> Result<Option<Snapshot>, Error>;

    /// Insert or replace the entry for `key`.
    async fn put(&self, key: &RequestKey, snapshot: &Snapshot) -> Result<(), Error>;

    /// Insert or replace every entry, all or nothing.
    async fn put_all(&self, entries: &[(RequestKey, Snapshot)]) -> Result<(), Error>;

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error>;

    async fn keys(&self) -> Result<Vec<RequestKey>, Error>;
}

/// Handle to one named store inside a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: CacheDb,
    name: String,
}

#[async_trait::async_trait]
impl CacheStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RequestKey) -> Result<Option<Snapshot>, Error> {
        self.db.get_entry(&self.name, key).await
    }

    async fn put(&self, key: &RequestKey, snapshot: &Snapshot) -> Result<(), Error> {
        self.db.upsert_entry(&self.name, key, snapshot).await
    }

    async fn put_all(&self, entries: &[(RequestKey, Snapshot)]) -> Result<(), Error> {
        self.db.upsert_entries(&self.name, entries).await
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        self.db.delete_entry(&self.name, key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.db.entry_keys(&self.name).await
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open_store(&self, name: &str) -> Result<Arc<dyn CacheStore>, Error> {
        self.create_store(name).await?;
        Ok(Arc::new(SqliteStore { db: self.clone(), name: name.to_string() }))
    }

    async fn has_store(&self, name: &str) -> Result<bool, Error> {
        self.store_exists(name).await
    }

    async fn list_store_names(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.drop_store(name).await
    }

    async fn mark_activated(&self, name: &str) -> Result<bool, Error> {
        self.mark_store_activated(name).await
    }

    async fn is_activated(&self, name: &str) -> Result<bool, Error> {
        self.store_activated(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Response;

    fn key(path: &str) -> RequestKey {
        let scope = url::Url::parse("http://localhost:8080/").unwrap();
        RequestKey::parse(path, &scope).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has_store("v1").await.unwrap());

        let store = db.open_store("v1").await.unwrap();
        assert_eq!(store.name(), "v1");
        assert!(db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_roundtrip_through_trait() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let snapshot = Response::new(200, "hello").snapshot();

        store.put(&key("/hello"), &snapshot).await.unwrap();
        assert_eq!(store.get(&key("/hello")).await.unwrap(), Some(snapshot));
        assert_eq!(store.keys().await.unwrap(), vec![key("/hello")]);

        assert!(store.delete(&key("/hello")).await.unwrap());
        assert!(store.get(&key("/hello")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap().put(&key("/"), &Response::new(200, "x").snapshot()).await.unwrap();

        let reopened = db.open_store("v1").await.unwrap();
        assert_eq!(reopened.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_store_twice() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();

        assert!(db.delete_store("v1").await.unwrap());
        assert!(!db.delete_store("v1").await.unwrap());
        assert!(db.list_store_names().await.unwrap().is_empty());
    }
}
