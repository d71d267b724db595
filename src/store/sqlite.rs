//! SQLite store backend
//!
//! This module provides a persistent implementation of [`CacheStorage`] on top of
//! a single rusqlite connection shared by every open store.

use crate::http::{Headers, Response};
use crate::store::schema::initialize_schema;
use crate::store::traits::{CacheStorage, ContentStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedConnection = Arc<Mutex<Connection>>;

fn lock(conn: &SharedConnection) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StoreError::LockPoisoned)
}

/// SQLite-backed collection of named stores
pub struct SqliteCacheStorage {
    conn: SharedConnection,
}

impl SqliteCacheStorage {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteCacheStorage)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn open(&self, name: &str) -> StoreResult<Arc<dyn ContentStore>> {
        {
            let conn = lock(&self.conn)?;
            let created = conn.execute(
                "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                params![name, Utc::now().to_rfc3339()],
            )?;
            if created > 0 {
                tracing::debug!("Created store {}", name);
            }
        }

        let store: Arc<dyn ContentStore> = Arc::new(SqliteStore {
            name: name.to_string(),
            conn: Arc::clone(&self.conn),
        });
        Ok(store)
    }

    async fn has(&self, name: &str) -> StoreResult<bool> {
        let conn = lock(&self.conn)?;
        let found: Option<String> = conn
            .query_row(
                "SELECT name FROM caches WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn delete(&self, name: &str) -> StoreResult<bool> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
        Ok(removed > 0)
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

/// One named store inside the shared database
pub struct SqliteStore {
    name: String,
    conn: SharedConnection,
}

#[async_trait]
impl ContentStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_url(&self, key: &str) -> StoreResult<Option<Response>> {
        let conn = lock(&self.conn)?;
        let row = conn
            .query_row(
                "SELECT status, headers, body, opaque FROM entries WHERE cache_name = ?1 AND url = ?2",
                params![self.name, key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((status, headers, body, opaque)) => {
                let headers: Headers = serde_json::from_str(&headers)?;
                let status = u16::try_from(status).unwrap_or(0);
                Ok(Some(Response::from_parts(status, headers, body, opaque)))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, response: &Response) -> StoreResult<()> {
        let headers = serde_json::to_string(response.headers())?;
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO entries (cache_name, url, status, headers, body, opaque, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.name,
                key,
                i64::from(response.status()),
                headers,
                response.body(),
                response.is_opaque(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM entries WHERE cache_name = ?1 AND url = ?2",
            params![self.name, key],
        )?;
        Ok(removed > 0)
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT url FROM entries WHERE cache_name = ?1 ORDER BY url")?;
        let keys = stmt
            .query_map(params![self.name], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn page(body: &str) -> Response {
        Response::new(200)
            .with_header("content-type", "text/html")
            .with_body(body)
    }

    #[tokio::test]
    async fn test_put_then_match() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let store = storage.open("unblocked-games-1").await.unwrap();

        store.put("https://example.com/", &page("<p>home</p>")).await.unwrap();

        let found = store.match_url("https://example.com/").await.unwrap().unwrap();
        assert_eq!(found.status(), 200);
        assert_eq!(found.body(), b"<p>home</p>");
        assert_eq!(found.content_type(), Some("text/html"));
        assert!(!found.is_opaque());
    }

    #[tokio::test]
    async fn test_opaque_roundtrip() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let store = storage.open("unblocked-games-1").await.unwrap();

        store
            .put("https://cdn.example.net/a.png", &Response::opaque(vec![1, 2, 3]))
            .await
            .unwrap();

        let found = store
            .match_url("https://cdn.example.net/a.png")
            .await
            .unwrap()
            .unwrap();
        assert!(found.is_opaque());
        assert_eq!(found.body(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let v1 = storage.open("games-1").await.unwrap();
        let v2 = storage.open("games-2").await.unwrap();

        v1.put("k", &page("one")).await.unwrap();
        assert!(v2.match_url("k").await.unwrap().is_none());
        assert_eq!(v1.keys().await.unwrap(), vec!["k".to_string()]);
        assert!(v2.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let v1 = storage.open("games-1").await.unwrap();
        v1.put("k", &page("one")).await.unwrap();

        assert!(storage.delete("games-1").await.unwrap());
        assert!(!storage.has("games-1").await.unwrap());

        let reopened = storage.open("games-1").await.unwrap();
        assert!(reopened.match_url("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_names_listed() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        storage.open("b").await.unwrap();
        storage.open("a").await.unwrap();
        storage.open("a").await.unwrap();

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tidepool.db");

        {
            let storage = SqliteCacheStorage::new(&path).unwrap();
            let store = storage.open("games-1").await.unwrap();
            store.put("k", &page("kept")).await.unwrap();
        }

        let storage = SqliteCacheStorage::new(&path).unwrap();
        assert!(storage.has("games-1").await.unwrap());
        let store = storage.open("games-1").await.unwrap();
        let found = store.match_url("k").await.unwrap().unwrap();
        assert_eq!(found.body(), b"kept");
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let store = storage.open("games-1").await.unwrap();
        store.put("k", &page("x")).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }
}
