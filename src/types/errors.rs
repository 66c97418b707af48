use thiserror::Error;

// === StoreError ===

/// Errors raised by a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot be reached (closed, locked, switched off).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// SQLite returned an error.
    #[error("Store database error: {0}")]
    Database(String),
    /// A stored document could not be encoded or decoded.
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

// === MarkerError ===

/// Errors surfaced by marker repository operations.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// Reading or writing the persistent store failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    /// An import payload is missing its `markers` field or has the wrong shape.
    #[error("Invalid import data format: {0}")]
    InvalidFormat(String),
    /// No marker with the given ID exists in the collection.
    #[error("Marker not found: {0}")]
    NotFound(String),
    /// Caller input was rejected (e.g. an empty title).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Marker data could not be encoded or decoded.
    #[error("Marker serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for MarkerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Serialization(msg) => MarkerError::Serialization(msg),
            other => MarkerError::StorageUnavailable(other.to_string()),
        }
    }
}

// === SettingsError ===

/// Errors related to feature-toggle settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings document failed.
    #[error("Settings storage error: {0}")]
    Storage(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    Serialization(String),
    /// The provided settings key is not a known toggle.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value has the wrong type.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

impl From<StoreError> for SettingsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Serialization(msg) => SettingsError::Serialization(msg),
            other => SettingsError::Storage(other.to_string()),
        }
    }
}

// === ShortcutError ===

/// Errors related to keyboard shortcut bindings.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// Shortcut for the given action was not found.
    #[error("Shortcut not found for action: {0}")]
    NotFound(String),
    /// The shortcut keys conflict with an existing binding.
    #[error("Shortcut conflict: {0}")]
    Conflict(String),
    /// The provided key combination is invalid.
    #[error("Invalid shortcut keys: {0}")]
    InvalidKeys(String),
}
