//! Durable key-value stores.
//!
//! The configuration adapter only needs string keys mapped to string values.
//! [`SqliteKeyValueStore`] keeps them in the `settings` table; the
//! [`MemoryKeyValueStore`] keeps them in a map and is used by tests and by
//! `irlinkd --database-path :memory:`.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use sqlx::Row;
use tokio::sync::RwLock;

use crate::connection::Database;
use crate::error::{StorageError, StorageResult};

/// String key-value store.
///
/// Futures are `Send` so the store can be used from axum handlers running on
/// the multi-threaded runtime.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = StorageResult<Option<String>>> + Send;

    /// Insert or replace the value stored under `key`.
    fn put(&self, key: &str, value: &str) -> impl Future<Output = StorageResult<()>> + Send;

    /// Remove `key`. Returns `true` if it existed.
    fn remove(&self, key: &str) -> impl Future<Output = StorageResult<bool>> + Send;
}

/// SQLite implementation of [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db: Database,
}

impl SqliteKeyValueStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory implementation of [`KeyValueStore`].
///
/// Clones share the same map, so a test can keep one clone to inspect or
/// pre-seed what the controller sees.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `put`/`remove` fail, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().await.clone()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory store is read-only".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        self.check_writable()?;
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

/// Enum wrapper for store dispatch, chosen at start-up.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyKeyValueStore {
    Sqlite(SqliteKeyValueStore),
    Memory(MemoryKeyValueStore),
}

impl KeyValueStore for AnyKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Sqlite(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Sqlite(store) => store.put(key, value).await,
            Self::Memory(store) => store.put(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        match self {
            Self::Sqlite(store) => store.remove(key).await,
            Self::Memory(store) => store.remove(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.put("k", "v1").await.unwrap();
        store.put("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemoryKeyValueStore::new();
        let observer = store.clone();
        store.put("board_id", "rack").await.unwrap();
        assert_eq!(observer.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_fail_writes() {
        let store = MemoryKeyValueStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.put("k", "v").await,
            Err(StorageError::Unavailable(_))
        ));
        store.set_fail_writes(false);
        store.put("k", "v").await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_store_upsert() {
        let store = SqliteKeyValueStore::new(Database::in_memory().await.unwrap());
        store.put("k", "v1").await.unwrap();
        store.put("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert!(store.remove("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
