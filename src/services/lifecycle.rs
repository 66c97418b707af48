// PageMark Lifecycle Coordinator
// Install/update hooks, context menu, tab and storage events, and the
// store-wide message handlers (stats, clear, export, import, settings).

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::database::store::{write_document, KeyValueStore, MARKERS_KEY};
use crate::managers::marker_library::{MarkerLibrary, MarkerLibraryTrait};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::MarkerError;
use crate::types::marker::MarkerStore;
use crate::types::message::{failure_response, success_response, PageMessage};
use crate::types::settings::PageMarkSettings;

/// Context menu entry that saves the current position.
pub const MENU_SAVE_POSITION: &str = "pagemark-save-position";

/// Context menu entry that toggles the marker panel.
pub const MENU_SHOW_MARKERS: &str = "pagemark-show-markers";

/// Why the extension lifecycle hook fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
}

/// Result of the install hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub store_initialized: bool,
    pub open_welcome_page: bool,
}

/// A page context menu entry to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextMenuItem {
    pub id: &'static str,
    pub title: &'static str,
}

/// Background coordinator shared by all pages.
pub struct LifecycleCoordinator {
    store: Arc<dyn KeyValueStore>,
    library: MarkerLibrary,
    settings_engine: SettingsEngine,
}

impl LifecycleCoordinator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            library: MarkerLibrary::new(Arc::clone(&store)),
            settings_engine: SettingsEngine::new(Arc::clone(&store)),
            store,
        }
    }

    /// Loads settings from the store; falls back to defaults on failure.
    pub fn startup(&mut self) -> PageMarkSettings {
        match self.settings_engine.load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "loading settings failed, using defaults");
                PageMarkSettings::default()
            }
        }
    }

    pub fn settings(&self) -> &PageMarkSettings {
        self.settings_engine.get_settings()
    }

    /// First install writes an empty marker map and default settings.
    /// Updates leave stored data alone.
    pub fn on_installed(&mut self, reason: InstallReason) -> Result<InstallOutcome, MarkerError> {
        match reason {
            InstallReason::Install => {
                write_document(self.store.as_ref(), MARKERS_KEY, &MarkerStore::new())?;
                self.settings_engine
                    .reset()
                    .map_err(|e| MarkerError::StorageUnavailable(e.to_string()))?;
                tracing::info!("PageMark installed");
                Ok(InstallOutcome { store_initialized: true, open_welcome_page: true })
            }
            InstallReason::Update => {
                tracing::info!("PageMark updated");
                Ok(InstallOutcome { store_initialized: false, open_welcome_page: false })
            }
        }
    }

    /// Entries registered on the page context menu.
    pub fn context_menu_items(&self) -> Vec<ContextMenuItem> {
        vec![
            ContextMenuItem { id: MENU_SAVE_POSITION, title: "Save current position" },
            ContextMenuItem { id: MENU_SHOW_MARKERS, title: "Show saved markers" },
        ]
    }

    /// Message to send to the page when a context menu entry is clicked.
    pub fn on_context_menu_click(&self, menu_item_id: &str) -> Option<PageMessage> {
        match menu_item_id {
            MENU_SAVE_POSITION => Some(PageMessage::SavePosition { title: None }),
            MENU_SHOW_MARKERS => Some(PageMessage::TogglePanel),
            _ => None,
        }
    }

    /// Announces saved markers once a tab finishes loading a page that has any.
    pub fn on_tab_updated(&self, url: &str, load_complete: bool) -> Option<PageMessage> {
        if !load_complete {
            return None;
        }
        match self.library.markers_for(url) {
            Ok(markers) if !markers.is_empty() => Some(PageMessage::MarkersAvailable { count: markers.len() }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(url, error = %e, "checking markers for loaded tab failed");
                None
            }
        }
    }

    /// Tells every page to reload when the marker map changed.
    pub fn on_storage_changed(&self, changed_key: &str) -> Option<PageMessage> {
        (changed_key == MARKERS_KEY).then_some(PageMessage::MarkersUpdated)
    }

    /// Dispatches a store-wide message from the popup.
    ///
    /// Operation failures are reported as `{"success": false, "error"}`.
    pub fn handle_message(&mut self, action: &str, params: &Value) -> Result<Value, String> {
        match action {
            "getStats" => Ok(match self.library.stats() {
                Ok(stats) => success_response(json!({"stats": stats})),
                Err(e) => failure_response(&e),
            }),
            "clearAllMarkers" => Ok(match self.library.clear_all() {
                Ok(()) => success_response(Value::Null),
                Err(e) => failure_response(&e),
            }),
            "exportMarkers" => Ok(match self.library.export_all() {
                Ok(data) => success_response(json!({"data": data})),
                Err(e) => failure_response(&e),
            }),
            "importMarkers" => {
                let data = params.get("data").unwrap_or(&Value::Null);
                Ok(match self.library.import_all(data) {
                    Ok(()) => success_response(Value::Null),
                    Err(e) => failure_response(&e),
                })
            }
            "getSettings" => Ok(success_response(json!({"settings": self.settings_engine.get_settings()}))),
            "setSetting" => {
                let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
                let value = params.get("value").cloned().ok_or("missing value")?;
                Ok(match self.settings_engine.set_value(key, value) {
                    Ok(()) => success_response(json!({"settings": self.settings_engine.get_settings()})),
                    Err(e) => failure_response(&e),
                })
            }
            _ => Err(format!("unknown action: {}", action)),
        }
    }
}
