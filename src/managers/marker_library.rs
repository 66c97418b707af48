//! Store-wide marker operations.
//!
//! Everything that spans pages lives here: statistics, clear-all, export,
//! import-with-merge, cross-page delete and the recent-markers feed. The
//! page-scoped [`MarkerRepository`](super::marker_repository::MarkerRepository)
//! delegates its store-wide operations to this type.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::database::store::{read_document, write_document, KeyValueStore, MARKERS_KEY};
use crate::types::errors::MarkerError;
use crate::types::marker::{ExportData, Marker, MarkerStats, MarkerStore, EXPORT_VERSION};

/// Trait defining store-wide marker operations.
pub trait MarkerLibraryTrait {
    fn all(&self) -> Result<MarkerStore, MarkerError>;
    fn markers_for(&self, url: &str) -> Result<Vec<Marker>, MarkerError>;
    fn delete_marker(&self, url: &str, marker_id: &str) -> Result<(), MarkerError>;
    fn recent(&self, limit: usize) -> Result<Vec<Marker>, MarkerError>;
    fn clear_all(&self) -> Result<(), MarkerError>;
    fn export_all(&self) -> Result<ExportData, MarkerError>;
    fn import_all(&self, import_data: &Value) -> Result<(), MarkerError>;
    fn stats(&self) -> Result<MarkerStats, MarkerError>;
}

/// Marker operations over the whole store.
#[derive(Clone)]
pub struct MarkerLibrary {
    store: Arc<dyn KeyValueStore>,
}

impl MarkerLibrary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Replaces the persisted marker map.
    pub(crate) fn write_all(&self, markers: &MarkerStore) -> Result<(), MarkerError> {
        write_document(self.store.as_ref(), MARKERS_KEY, markers)?;
        Ok(())
    }
}

/// Merges `imported` into `existing`.
///
/// URLs new to `existing` are adopted wholesale. For URLs present in both,
/// imported markers are appended only when their ID is not already in the
/// existing collection, so existing markers always win.
pub fn merge_stores(mut existing: MarkerStore, imported: MarkerStore) -> MarkerStore {
    for (url, incoming) in imported {
        match existing.get_mut(&url) {
            Some(current) => {
                for marker in incoming {
                    if !current.iter().any(|m| m.id == marker.id) {
                        current.push(marker);
                    }
                }
            }
            None => {
                existing.insert(url, incoming);
            }
        }
    }
    existing
}

/// Validates an import payload and extracts its marker map.
pub fn parse_import(import_data: &Value) -> Result<MarkerStore, MarkerError> {
    let markers = match import_data.get("markers") {
        Some(Value::Null) | None => {
            return Err(MarkerError::InvalidFormat("missing markers field".to_string()));
        }
        Some(markers) => markers,
    };
    serde_json::from_value(markers.clone()).map_err(|e| MarkerError::InvalidFormat(e.to_string()))
}

/// Aggregates counts over a marker map.
///
/// Storage is estimated from the compact JSON encoding of each non-empty
/// collection, rounded to the nearest kilobyte.
pub fn compute_stats(markers: &MarkerStore) -> MarkerStats {
    let mut total_markers = 0;
    let mut total_pages = 0;
    let mut total_bytes = 0usize;

    for collection in markers.values() {
        total_markers += collection.len();
        if !collection.is_empty() {
            total_pages += 1;
            total_bytes += serde_json::to_string(collection).map(|s| s.len()).unwrap_or(0);
        }
    }

    MarkerStats {
        total_markers,
        total_pages,
        total_storage_kb: (total_bytes as f64 / 1024.0).round() as u64,
    }
}

impl MarkerLibraryTrait for MarkerLibrary {
    /// Returns the whole marker map (empty if never written).
    fn all(&self) -> Result<MarkerStore, MarkerError> {
        Ok(read_document(self.store.as_ref(), MARKERS_KEY)?.unwrap_or_default())
    }

    fn markers_for(&self, url: &str) -> Result<Vec<Marker>, MarkerError> {
        Ok(self.all()?.remove(url).unwrap_or_default())
    }

    /// Removes one marker from any page. Unknown URLs and IDs are ignored.
    fn delete_marker(&self, url: &str, marker_id: &str) -> Result<(), MarkerError> {
        let mut all = self.all()?;
        let Some(collection) = all.get_mut(url) else {
            return Ok(());
        };
        let before = collection.len();
        collection.retain(|m| m.id != marker_id);
        if collection.len() == before {
            tracing::debug!(url, marker_id, "delete skipped, marker not present");
            return Ok(());
        }
        self.write_all(&all)
    }

    /// Newest markers across all pages, most recent first.
    fn recent(&self, limit: usize) -> Result<Vec<Marker>, MarkerError> {
        let mut flat: Vec<Marker> = self
            .all()?
            .into_iter()
            .flat_map(|(url, collection)| {
                collection.into_iter().map(move |mut m| {
                    m.url = url.clone();
                    m
                })
            })
            .collect();
        flat.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        flat.truncate(limit);
        Ok(flat)
    }

    fn clear_all(&self) -> Result<(), MarkerError> {
        self.write_all(&MarkerStore::new()).inspect_err(|e| {
            tracing::error!(error = %e, "clearing markers failed");
        })?;
        tracing::info!("all markers cleared");
        Ok(())
    }

    fn export_all(&self) -> Result<ExportData, MarkerError> {
        let markers = self.all().inspect_err(|e| {
            tracing::error!(error = %e, "exporting markers failed");
        })?;
        Ok(ExportData {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now(),
            markers,
        })
    }

    /// Merges an exported snapshot into the store.
    ///
    /// The payload is validated before the store is read, so a malformed
    /// import never touches persisted state.
    fn import_all(&self, import_data: &Value) -> Result<(), MarkerError> {
        let imported = parse_import(import_data).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected import");
        })?;
        let pages = imported.len();
        let merged = merge_stores(self.all()?, imported);
        self.write_all(&merged).inspect_err(|e| {
            tracing::error!(error = %e, "importing markers failed");
        })?;
        tracing::info!(pages, "markers imported");
        Ok(())
    }

    fn stats(&self) -> Result<MarkerStats, MarkerError> {
        Ok(compute_stats(&self.all()?))
    }
}
