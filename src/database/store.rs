//! Key-value document store.
//!
//! Every key holds one JSON document that is read and written whole. The
//! marker map and the settings record each live under their own key.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::connection::Database;
use crate::types::errors::StoreError;

/// Key holding the URL → markers map.
pub const MARKERS_KEY: &str = "pagemark_markers";

/// Key holding the feature-toggle settings.
pub const SETTINGS_KEY: &str = "pagemark_settings";

/// A namespace of whole-document JSON values.
///
/// There are no partial updates and no transactions across keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Reads `key` and decodes it as `T`. A missing key yields `None`.
pub fn read_document<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e))),
    }
}

/// Encodes `doc` and writes it under `key`, replacing the previous document.
pub fn write_document<T: Serialize>(store: &dyn KeyValueStore, key: &str, doc: &T) -> Result<(), StoreError> {
    let value = serde_json::to_value(doc).map_err(|e| StoreError::Serialization(format!("{}: {}", key, e)))?;
    store.set(key, value)
}

/// Durable store backed by the `kv_store` SQLite table.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::from_database(Database::open(path)?))
    }

    /// Opens a throwaway in-memory SQLite store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let db = self.db.lock();
        let raw: Option<String> = db
            .connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        match raw {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(&value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let db = self.db.lock();
        db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, text, chrono::Utc::now().timestamp_millis()],
        )?;
        tracing::trace!(key, bytes = text.len(), "store write");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let db = self.db.lock();
        db.connection().execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-process store for tests and demos.
///
/// Can be switched unavailable to make every call fail.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Value>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent reads and writes fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<parking_lot::MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage is switched off".to_string()));
        }
        Ok(self.data.lock())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.check()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.check()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?.remove(key);
        Ok(())
    }
}
