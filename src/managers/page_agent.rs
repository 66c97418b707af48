//! Page Agent for PageMark.
//!
//! One agent runs per open page. It owns the page's [`MarkerRepository`],
//! tracks the viewport, lays out scrollbar indicators, debounces the
//! "last position" auto-save, maps keyboard shortcuts and answers the
//! messages the popup and the lifecycle coordinator send to the page.
//!
//! Rendering is left to the embedding UI: the agent exposes indicator
//! positions, panel entries, a pending scroll target and notification
//! strings for it to draw.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

use super::marker_repository::{MarkerRepository, MarkerRepositoryTrait};
use super::shortcut_manager::{ShortcutAction, ShortcutManager, ShortcutManagerTrait};
use crate::database::store::KeyValueStore;
use crate::services::auto_save_scheduler::AutoSaveScheduler;
use crate::services::scrollbar_mapping::{IndicatorPosition, ScrollMetrics, ScrollbarLayout};
use crate::types::errors::MarkerError;
use crate::types::marker::{format_relative_time, Marker};
use crate::types::message::{failure_response, success_response};
use crate::types::settings::PageMarkSettings;

/// Scroll offsets and dimensions of the page's scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_height: self.scroll_height,
            client_height: self.client_height,
        }
    }
}

/// Offsets the UI should smoothly scroll to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTarget {
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// One row of the in-page marker panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelEntry {
    pub id: String,
    pub title: String,
    pub time_label: String,
}

/// Per-page marker controller.
pub struct PageAgent {
    repository: Arc<Mutex<MarkerRepository>>,
    settings: PageMarkSettings,
    shortcuts: ShortcutManager,
    scheduler: AutoSaveScheduler,
    layout: ScrollbarLayout,
    page_title: String,
    viewport: Viewport,
    indicators: Vec<IndicatorPosition>,
    panel_visible: bool,
    scroll_target: Option<ScrollTarget>,
    notifications: Vec<String>,
    available_hint: Option<usize>,
}

impl PageAgent {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        url: &str,
        page_title: &str,
        settings: PageMarkSettings,
        quiet_period: Duration,
    ) -> Self {
        Self {
            repository: Arc::new(Mutex::new(MarkerRepository::new(store, url))),
            settings,
            shortcuts: ShortcutManager::new(),
            scheduler: AutoSaveScheduler::new(quiet_period),
            layout: ScrollbarLayout::default(),
            page_title: page_title.to_string(),
            viewport: Viewport::default(),
            indicators: Vec::new(),
            panel_visible: false,
            scroll_target: None,
            notifications: Vec::new(),
            available_hint: None,
        }
    }

    pub fn url(&self) -> String {
        self.repository.lock().url().to_string()
    }

    /// Reads this page's markers from the store and refreshes indicators.
    pub fn load(&mut self) -> Result<usize, MarkerError> {
        let count = self.repository.lock().load()?.len();
        self.refresh_indicators();
        Ok(count)
    }

    /// Snapshot of the page's markers in display order.
    pub fn markers(&self) -> Vec<Marker> {
        self.repository.lock().list().to_vec()
    }

    pub fn settings(&self) -> &PageMarkSettings {
        &self.settings
    }

    /// Applies new toggles. Turning auto-save off drops a pending save.
    pub fn apply_settings(&mut self, settings: PageMarkSettings) {
        if !settings.auto_save {
            self.scheduler.cancel();
        }
        self.settings = settings;
        self.refresh_indicators();
    }

    pub fn set_page_title(&mut self, page_title: &str) {
        self.page_title = page_title.to_string();
    }

    /// Saves the current viewport position under `title`.
    ///
    /// A missing or blank title means the user dismissed the name prompt;
    /// nothing is saved and `Ok(None)` is returned.
    pub fn save_current_position(&mut self, title: Option<&str>) -> Result<Option<Marker>, MarkerError> {
        let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };
        let result = self.repository.lock().create(
            title,
            self.viewport.scroll_x,
            self.viewport.scroll_y,
            &self.page_title,
        );
        match result {
            Ok(marker) => {
                self.refresh_indicators();
                self.notify(format!("Position \"{}\" saved!", marker.title));
                Ok(Some(marker))
            }
            Err(e) => {
                self.notify(format!("Could not save position: {}", e));
                Err(e)
            }
        }
    }

    /// Requests a scroll to the marker's offsets.
    pub fn scroll_to_marker(&mut self, marker_id: &str) -> Result<ScrollTarget, MarkerError> {
        let found = self.repository.lock().find(marker_id).cloned();
        let marker = found.ok_or_else(|| MarkerError::NotFound(marker_id.to_string()))?;
        let target = ScrollTarget {
            scroll_x: marker.scroll_x,
            scroll_y: marker.scroll_y,
        };
        self.scroll_target = Some(target);
        self.notify(format!("Scrolled to \"{}\"", marker.title));
        Ok(target)
    }

    /// Deletes a marker from this page. Unknown IDs are ignored.
    pub fn delete_marker(&mut self, marker_id: &str) -> Result<(), MarkerError> {
        let result = self.repository.lock().delete(marker_id);
        match result {
            Ok(()) => {
                self.refresh_indicators();
                Ok(())
            }
            Err(e) => {
                self.notify(format!("Could not delete marker: {}", e));
                Err(e)
            }
        }
    }

    /// Shows or hides the marker panel; returns the new visibility.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_visible = !self.panel_visible;
        self.panel_visible
    }

    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Rows for the marker panel, with time labels relative to `now`.
    pub fn panel_entries(&self, now: DateTime<Utc>) -> Vec<PanelEntry> {
        self.repository
            .lock()
            .list()
            .iter()
            .map(|m| PanelEntry {
                id: m.id.clone(),
                title: m.title.clone(),
                time_label: format_relative_time(m.timestamp, now),
            })
            .collect()
    }

    /// Handles a scroll event.
    ///
    /// Indicators are re-laid out immediately; the auto-save is pushed back
    /// by the quiet period. Must be called from within a tokio runtime.
    pub fn on_scroll(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.refresh_indicators();

        if !self.settings.auto_save {
            return;
        }
        let repository = Arc::clone(&self.repository);
        let page_title = self.page_title.clone();
        self.scheduler.reschedule(move || {
            let mut repo = repository.lock();
            if let Err(e) = repo.auto_save(viewport.scroll_x, viewport.scroll_y, &page_title) {
                tracing::warn!(url = %repo.url(), error = %e, "auto-save failed");
            }
        });
    }

    /// Handles a viewport resize without scheduling a save.
    pub fn on_resize(&mut self, scroll_height: f64, client_height: f64) {
        self.viewport.scroll_height = scroll_height;
        self.viewport.client_height = client_height;
        self.refresh_indicators();
    }

    pub fn is_auto_save_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Replaces the key bindings, e.g. after the user rebinds a shortcut.
    pub fn set_shortcuts(&mut self, shortcuts: ShortcutManager) {
        self.shortcuts = shortcuts;
    }

    /// Resolves a key chord to a page action.
    ///
    /// `TogglePanel` is applied here. `SavePosition` is returned for the UI
    /// to prompt for a name and call [`Self::save_current_position`].
    /// Returns `None` when shortcuts are disabled or nothing is bound.
    pub fn handle_key(&mut self, keys: &str) -> Option<ShortcutAction> {
        if !self.settings.keyboard_shortcuts {
            return None;
        }
        let action = self.shortcuts.resolve(keys)?;
        if action == ShortcutAction::TogglePanel {
            self.toggle_panel();
        }
        Some(action)
    }

    /// Current scrollbar indicators (empty when visual markers are off).
    pub fn indicators(&self) -> &[IndicatorPosition] {
        &self.indicators
    }

    /// Takes the pending scroll request, if any.
    pub fn take_scroll_target(&mut self) -> Option<ScrollTarget> {
        self.scroll_target.take()
    }

    /// Drains transient notifications for display.
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    /// Marker count announced by the lifecycle coordinator when the tab loaded.
    pub fn available_hint(&self) -> Option<usize> {
        self.available_hint
    }

    /// Dispatches a message addressed to this page.
    ///
    /// Operation failures come back as `{"success": false, "error"}`; `Err`
    /// is reserved for malformed requests and unknown actions.
    pub fn handle_message(&mut self, action: &str, params: &Value) -> Result<Value, String> {
        match action {
            "savePosition" => {
                let title = params.get("title").and_then(|v| v.as_str());
                Ok(match self.save_current_position(title) {
                    Ok(saved) => success_response(json!({"saved": saved.is_some()})),
                    Err(e) => failure_response(&e),
                })
            }
            "getMarkers" => Ok(json!({"markers": self.markers()})),
            "scrollToMarker" => {
                let id = params.get("markerId").and_then(|v| v.as_str()).ok_or("missing markerId")?;
                Ok(match self.scroll_to_marker(id) {
                    Ok(_) => success_response(Value::Null),
                    Err(e) => failure_response(&e),
                })
            }
            "deleteMarker" => {
                let id = params.get("markerId").and_then(|v| v.as_str()).ok_or("missing markerId")?;
                Ok(match self.delete_marker(id) {
                    Ok(()) => success_response(Value::Null),
                    Err(e) => failure_response(&e),
                })
            }
            "togglePanel" => {
                let visible = self.toggle_panel();
                Ok(success_response(json!({"visible": visible})))
            }
            "markersAvailable" => {
                let count = params.get("count").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
                self.available_hint = Some(count);
                tracing::debug!(count, "markers available for page");
                Ok(Value::Null)
            }
            "markersUpdated" => {
                if let Err(e) = self.load() {
                    tracing::warn!(error = %e, "reload after store change failed");
                }
                Ok(Value::Null)
            }
            _ => Err(format!("unknown action: {}", action)),
        }
    }

    fn refresh_indicators(&mut self) {
        self.indicators = if self.settings.show_visual_markers {
            self.layout.layout(self.repository.lock().list(), self.viewport.metrics())
        } else {
            Vec::new()
        };
    }

    fn notify(&mut self, message: String) {
        tracing::debug!(%message, "page notification");
        self.notifications.push(message);
    }
}
