//! Whole-store management: create, list, activate, delete.

use tokio_rusqlite::params;

use super::connection::CacheDb;
use crate::Error;

impl CacheDb {
    /// Create the named store if it does not exist yet.
    pub async fn create_store(&self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether the named store exists.
    pub async fn store_exists(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all stores, in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Record that the named store's generation took control.
    ///
    /// Returns false when no such store exists.
    pub async fn mark_store_activated(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "UPDATE stores SET activated_at = ?1 WHERE name = ?2",
                    params![chrono::Utc::now().to_rfc3339(), name],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether the named store exists and its generation has activated.
    pub async fn store_activated(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let activated: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1 AND activated_at IS NOT NULL)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(activated)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the named store and all of its entries.
    ///
    /// Returns false when no such store existed.
    pub async fn drop_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestKey, Response};

    #[tokio::test]
    async fn test_create_store_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_store("v1").await.unwrap();
        db.create_store("v1").await.unwrap();

        assert_eq!(db.store_names().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_create_store_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.create_store("").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_store_names_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_store("v2").await.unwrap();
        db.create_store("v1").await.unwrap();

        assert_eq!(db.store_names().await.unwrap(), vec!["v2".to_string(), "v1".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_store_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_store("v1").await.unwrap();
        let scope = url::Url::parse("http://localhost:8080/").unwrap();
        let key = RequestKey::parse("/", &scope).unwrap();
        db.upsert_entry("v1", &key, &Response::new(200, "x").snapshot()).await.unwrap();

        assert!(db.drop_store("v1").await.unwrap());
        assert!(!db.store_exists("v1").await.unwrap());
        assert_eq!(db.count_entries("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_store_activated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_store("v1").await.unwrap();
        assert!(!db.store_activated("v1").await.unwrap());

        assert!(db.mark_store_activated("v1").await.unwrap());
        assert!(db.store_activated("v1").await.unwrap());

        db.create_store("v1").await.unwrap();
        assert!(db.store_activated("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_missing_store_activated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.mark_store_activated("v1").await.unwrap());
        assert!(!db.store_activated("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_activation_survives_reopen() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        db.create_store("v1").await.unwrap();
        db.mark_store_activated("v1").await.unwrap();
        drop(db);

        let reopened = CacheDb::open(&path).await.unwrap();
        assert!(reopened.store_activated("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_missing_store_is_noop() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.drop_store("never-created").await.unwrap());
    }
}
