//! Entry CRUD operations.
//!
//! Provides functions for creating, reading, and deleting buffered
//! response snapshots inside a named store.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::request::RequestKey;
use crate::response::{Response, ResponseKind, ResponseSource};
use crate::Error;

/// A durable, re-readable copy of a response.
///
/// Equality compares content only; `stored_at` is bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseKind,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: String,
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.status == other.status
            && self.status_text == other.status_text
            && self.kind == other.kind
            && self.headers == other.headers
            && self.body == other.body
    }
}

impl Eq for Snapshot {}

impl Snapshot {
    /// Replay the snapshot as a fresh response served from cache.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(self.status, self.body.clone())
            .with_kind(self.kind)
            .with_status_text(self.status_text.clone())
            .with_source(ResponseSource::Cache);
        if let Some(url) = self.url.as_deref().and_then(|u| url::Url::parse(u).ok()) {
            response = response.with_url(url);
        }
        response.headers = self.headers.clone();
        response
    }
}

/// Columns shared by every entry SELECT, in row-mapping order.
const ENTRY_COLUMNS: &str = "response_url, status, status_text, kind, headers_json, body, stored_at";

type EntryRow = (Option<String>, u16, String, String, String, Vec<u8>, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
}

fn decode(row: EntryRow) -> Result<Snapshot, Error> {
    let (url, status, status_text, kind, headers_json, body, stored_at) = row;
    let kind = kind.parse::<ResponseKind>().map_err(Error::CorruptEntry)?;
    let headers = serde_json::from_str(&headers_json)?;
    Ok(Snapshot { url, status, status_text, kind, headers, body: Bytes::from(body), stored_at })
}

fn upsert(conn: &rusqlite::Connection, store: &str, key: &RequestKey, snapshot: &Snapshot) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&snapshot.headers)?;
    conn.execute(
        "INSERT INTO entries (
            store, key_hash, method, url, response_url, status, status_text,
            kind, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            response_url = excluded.response_url,
            status = excluded.status,
            status_text = excluded.status_text,
            kind = excluded.kind,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            key.digest(),
            &key.method,
            &key.url,
            &snapshot.url,
            snapshot.status,
            &snapshot.status_text,
            snapshot.kind.as_str(),
            headers_json,
            &snapshot.body[..],
            &snapshot.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace the entry for `key` in `store`.
    pub async fn upsert_entry(&self, store: &str, key: &RequestKey, snapshot: &Snapshot) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let snapshot = snapshot.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { upsert(conn, &store, &key, &snapshot) })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace many entries in a single transaction.
    pub async fn upsert_entries(&self, store: &str, entries: &[(RequestKey, Snapshot)]) -> Result<(), Error> {
        let store = store.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (key, snapshot) in &entries {
                    upsert(&tx, &store, key, snapshot)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for `key` in `store`.
    ///
    /// Returns None if the store holds no entry for the key.
    pub async fn get_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Snapshot>, Error> {
        let store = store.to_string();
        let hash = key.digest();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt =
                    conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE store = ?1 AND key_hash = ?2"))?;

                match stmt.query_row(params![store, hash], read_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    /// Delete the entry for `key` in `store`.
    ///
    /// Returns whether an entry was removed.
    pub async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        let store = store.to_string();
        let hash = key.digest();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM entries WHERE store = ?1 AND key_hash = ?2", params![store, hash])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List request identities in `store`, oldest insertion first.
    pub async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE store = ?1 ORDER BY rowid ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries in `store`.
    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
