//! Marker Repository for PageMark.
//!
//! Implements `MarkerRepositoryTrait`: create, auto-save, delete and list
//! markers for one page URL, plus the store-wide operations (clear, export,
//! import, stats) forwarded to [`MarkerLibrary`].
//!
//! Each mutation reads the current marker map, applies the change to this
//! page's stored collection and writes the map back. The in-memory
//! collection is only a cache: it is replaced by the written collection
//! once the write has succeeded, so markers added by other writers since
//! the last load are kept.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::marker_library::{MarkerLibrary, MarkerLibraryTrait};
use crate::database::store::KeyValueStore;
use crate::types::errors::MarkerError;
use crate::types::marker::{
    clamp_offset, generate_marker_id, ExportData, Marker, MarkerStats, AUTO_SAVE_ID,
};

/// Trait defining page-scoped marker operations.
pub trait MarkerRepositoryTrait {
    fn load(&mut self) -> Result<&[Marker], MarkerError>;
    fn create(&mut self, title: &str, scroll_x: f64, scroll_y: f64, page_title: &str) -> Result<Marker, MarkerError>;
    fn auto_save(&mut self, scroll_x: f64, scroll_y: f64, page_title: &str) -> Result<Marker, MarkerError>;
    fn delete(&mut self, marker_id: &str) -> Result<(), MarkerError>;
    fn list(&self) -> &[Marker];
    fn find(&self, marker_id: &str) -> Option<&Marker>;
    fn clear_all(&mut self) -> Result<(), MarkerError>;
    fn export_all(&self) -> Result<ExportData, MarkerError>;
    fn import_all(&mut self, import_data: &Value) -> Result<(), MarkerError>;
    fn stats(&self) -> Result<MarkerStats, MarkerError>;
}

/// Markers of a single page, backed by the shared key-value store.
pub struct MarkerRepository {
    url: String,
    library: MarkerLibrary,
    markers: Vec<Marker>,
}

impl MarkerRepository {
    /// Creates a repository for `url`. The collection starts empty; call
    /// [`MarkerRepositoryTrait::load`] to read persisted markers.
    pub fn new(store: Arc<dyn KeyValueStore>, url: &str) -> Self {
        Self {
            url: url.to_string(),
            library: MarkerLibrary::new(store),
            markers: Vec::new(),
        }
    }

    /// The page URL this repository is scoped to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Applies `mutate` to the stored collection of this page, writes the
    /// map back, then adopts the written collection in memory.
    fn persist<F>(&mut self, mutate: F) -> Result<(), MarkerError>
    where
        F: FnOnce(&mut Vec<Marker>),
    {
        let mut all = self.library.all()?;
        let mut markers = all.remove(&self.url).unwrap_or_default();
        mutate(&mut markers);
        all.insert(self.url.clone(), markers.clone());
        self.library.write_all(&all).inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "saving markers failed");
        })?;
        self.markers = markers;
        Ok(())
    }
}

impl MarkerRepositoryTrait for MarkerRepository {
    /// Reads this page's markers from the store into memory.
    fn load(&mut self) -> Result<&[Marker], MarkerError> {
        self.markers = self.library.markers_for(&self.url).inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "loading markers failed");
        })?;
        tracing::debug!(url = %self.url, count = self.markers.len(), "markers loaded");
        Ok(&self.markers)
    }

    /// Appends a new user marker with a freshly generated ID.
    fn create(
        &mut self,
        title: &str,
        scroll_x: f64,
        scroll_y: f64,
        page_title: &str,
    ) -> Result<Marker, MarkerError> {
        if title.trim().is_empty() {
            return Err(MarkerError::InvalidInput("marker title cannot be empty".to_string()));
        }

        let now = Utc::now();
        let mut marker = Marker {
            id: String::new(),
            title: title.to_string(),
            url: self.url.clone(),
            scroll_y: clamp_offset(scroll_y),
            scroll_x: clamp_offset(scroll_x),
            timestamp: now,
            page_title: page_title.to_string(),
            is_auto: false,
        };

        self.persist(|markers| {
            marker.id = generate_marker_id(markers, now);
            markers.push(marker.clone());
        })?;
        tracing::info!(url = %self.url, id = %marker.id, "marker created");
        Ok(marker)
    }

    /// Upserts the "last position" marker, keeping its place in the list.
    fn auto_save(&mut self, scroll_x: f64, scroll_y: f64, page_title: &str) -> Result<Marker, MarkerError> {
        let marker = Marker::auto_save(&self.url, scroll_x, scroll_y, page_title, Utc::now());

        self.persist(|markers| match markers.iter().position(|m| m.id == AUTO_SAVE_ID) {
            Some(index) => markers[index] = marker.clone(),
            None => markers.push(marker.clone()),
        })?;
        tracing::debug!(url = %self.url, scroll_y = marker.scroll_y, "last position saved");
        Ok(marker)
    }

    /// Removes a marker. Deleting an unknown ID succeeds without changes.
    fn delete(&mut self, marker_id: &str) -> Result<(), MarkerError> {
        let mut removed = false;
        self.persist(|markers| {
            let before = markers.len();
            markers.retain(|m| m.id != marker_id);
            removed = markers.len() != before;
        })?;
        if !removed {
            tracing::debug!(url = %self.url, marker_id, "delete skipped, marker not present");
        }
        Ok(())
    }

    fn list(&self) -> &[Marker] {
        &self.markers
    }

    fn find(&self, marker_id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == marker_id)
    }

    /// Empties the whole store, not only this page.
    fn clear_all(&mut self) -> Result<(), MarkerError> {
        self.library.clear_all()?;
        self.markers.clear();
        Ok(())
    }

    fn export_all(&self) -> Result<ExportData, MarkerError> {
        self.library.export_all()
    }

    /// Merges an import into the store and reloads this page's collection.
    fn import_all(&mut self, import_data: &Value) -> Result<(), MarkerError> {
        self.library.import_all(import_data)?;
        self.load()?;
        Ok(())
    }

    fn stats(&self) -> Result<MarkerStats, MarkerError> {
        self.library.stats()
    }
}
