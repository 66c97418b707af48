// PageMark Settings Engine
// Manages the feature toggles: loading, saving, updating individual values, and resetting to defaults.
// Settings live in the key-value store under `pagemark_settings`.

use std::sync::Arc;

use crate::database::store::{read_document, write_document, KeyValueStore, SETTINGS_KEY};
use crate::types::errors::SettingsError;
use crate::types::settings::PageMarkSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<PageMarkSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &PageMarkSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
}

/// Settings engine that persists the toggles in the shared store.
pub struct SettingsEngine {
    store: Arc<dyn KeyValueStore>,
    settings: PageMarkSettings,
}

impl SettingsEngine {
    /// Creates an engine holding default settings until [`SettingsEngineTrait::load`] runs.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            settings: PageMarkSettings::default(),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the store.
    ///
    /// A missing document yields defaults; missing keys inside a stored
    /// document are filled with their defaults.
    fn load(&mut self) -> Result<PageMarkSettings, SettingsError> {
        self.settings = read_document(self.store.as_ref(), SETTINGS_KEY)?.unwrap_or_default();
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        write_document(self.store.as_ref(), SETTINGS_KEY, &self.settings)?;
        Ok(())
    }

    fn get_settings(&self) -> &PageMarkSettings {
        &self.settings
    }

    /// Updates one toggle by its camelCase key (`autoSave`, `showVisualMarkers`,
    /// `keyboardShortcuts`) and saves.
    ///
    /// The value is validated by round-tripping the settings through JSON, so
    /// only keys and value types the struct accepts get through.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings)
            .map_err(|e| SettingsError::Serialization(format!("Failed to serialize settings: {}", e)))?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)));
            }
        }

        let new_settings: PageMarkSettings = serde_json::from_value(json_value)
            .map_err(|e| SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e)))?;

        let previous = std::mem::replace(&mut self.settings, new_settings);
        if let Err(e) = self.save() {
            self.settings = previous;
            return Err(e);
        }
        tracing::info!(key, "setting updated");
        Ok(())
    }

    /// Resets all toggles to defaults and saves.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = PageMarkSettings::default();
        self.save()
    }
}
