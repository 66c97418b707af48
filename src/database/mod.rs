//! PageMark persistent store.
//!
//! A key-value namespace of JSON documents, backed either by SQLite
//! (durable) or by an in-process map.
//!
//! # Usage
//!
//! ```no_run
//! use pagemark::database::{KeyValueStore, SqliteStore};
//!
//! let store = SqliteStore::open("pagemark.db").expect("failed to open store");
//! let markers = store.get("pagemark_markers").expect("read failed");
//! ```

pub mod connection;
pub mod migrations;
pub mod store;

pub use connection::Database;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, MARKERS_KEY, SETTINGS_KEY};
