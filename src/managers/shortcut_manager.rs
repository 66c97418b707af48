//! Shortcut Manager for PageMark.
//!
//! Binds key chords to page actions with conflict detection and
//! platform-specific modifier adaptation (`Ctrl` becomes `Cmd` on macOS).

use std::collections::HashMap;

use crate::types::errors::ShortcutError;

/// Page actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    SavePosition,
    TogglePanel,
}

impl ShortcutAction {
    pub const ALL: [ShortcutAction; 2] = [ShortcutAction::SavePosition, ShortcutAction::TogglePanel];

    /// Parses an action name as used in messages (`savePosition`, `togglePanel`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShortcutAction::SavePosition => "savePosition",
            ShortcutAction::TogglePanel => "togglePanel",
        }
    }
}

/// Trait defining shortcut management operations.
pub trait ShortcutManagerTrait {
    fn register_shortcut(&mut self, action: ShortcutAction, keys: &str) -> Result<(), ShortcutError>;
    fn unregister_shortcut(&mut self, action: ShortcutAction) -> Result<(), ShortcutError>;
    fn get_shortcut(&self, action: ShortcutAction) -> Option<&str>;
    fn resolve(&self, keys: &str) -> Option<ShortcutAction>;
    fn reset_to_defaults(&mut self);
    fn has_conflict(&self, keys: &str, exclude_action: Option<ShortcutAction>) -> Option<ShortcutAction>;
}

/// In-memory shortcut table.
#[derive(Debug, Clone)]
pub struct ShortcutManager {
    shortcuts: HashMap<ShortcutAction, String>,
}

impl ShortcutManager {
    pub fn new() -> Self {
        Self { shortcuts: Self::default_shortcuts() }
    }

    /// `Ctrl+Shift+M` saves the position, `Ctrl+Shift+L` toggles the panel.
    pub fn default_shortcuts() -> HashMap<ShortcutAction, String> {
        [
            (ShortcutAction::SavePosition, "Ctrl+Shift+M"),
            (ShortcutAction::TogglePanel, "Ctrl+Shift+L"),
        ]
        .into_iter()
        .map(|(a, k)| (a, Self::normalize(k)))
        .collect()
    }

    /// Adapts modifiers for the platform and upper-cases single-letter keys,
    /// so `ctrl+shift+m` and `Ctrl+Shift+M` compare equal.
    fn normalize(keys: &str) -> String {
        let parts: Vec<String> = keys
            .split('+')
            .map(|part| {
                let part = part.trim();
                match part.to_ascii_lowercase().as_str() {
                    "ctrl" | "control" if cfg!(target_os = "macos") => "Cmd".to_string(),
                    "ctrl" | "control" => "Ctrl".to_string(),
                    "cmd" | "meta" => "Cmd".to_string(),
                    "shift" => "Shift".to_string(),
                    "alt" | "option" => "Alt".to_string(),
                    _ if part.len() == 1 => part.to_ascii_uppercase(),
                    _ => part.to_string(),
                }
            })
            .collect();
        parts.join("+")
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutManagerTrait for ShortcutManager {
    fn register_shortcut(&mut self, action: ShortcutAction, keys: &str) -> Result<(), ShortcutError> {
        if keys.trim().is_empty() || keys.split('+').any(|p| p.trim().is_empty()) {
            return Err(ShortcutError::InvalidKeys(format!("'{}'", keys)));
        }

        if let Some(conflicting) = self.has_conflict(keys, Some(action)) {
            return Err(ShortcutError::Conflict(format!(
                "'{}' is already bound to '{}'",
                keys,
                conflicting.name()
            )));
        }

        self.shortcuts.insert(action, Self::normalize(keys));
        Ok(())
    }

    fn unregister_shortcut(&mut self, action: ShortcutAction) -> Result<(), ShortcutError> {
        self.shortcuts
            .remove(&action)
            .map(|_| ())
            .ok_or_else(|| ShortcutError::NotFound(action.name().to_string()))
    }

    fn get_shortcut(&self, action: ShortcutAction) -> Option<&str> {
        self.shortcuts.get(&action).map(|s| s.as_str())
    }

    /// The action bound to `keys`, if any.
    fn resolve(&self, keys: &str) -> Option<ShortcutAction> {
        self.has_conflict(keys, None)
    }

    fn reset_to_defaults(&mut self) {
        self.shortcuts = Self::default_shortcuts();
    }

    fn has_conflict(&self, keys: &str, exclude_action: Option<ShortcutAction>) -> Option<ShortcutAction> {
        let normalized = Self::normalize(keys);
        self.shortcuts
            .iter()
            .find(|(action, bound)| **bound == normalized && Some(**action) != exclude_action)
            .map(|(action, _)| *action)
    }
}
