use serde::{Deserialize, Serialize};

fn enabled() -> bool {
    true
}

/// Feature toggles stored alongside the markers.
///
/// Every field defaults to `true`, both for a fresh install and for keys
/// missing from a stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMarkSettings {
    #[serde(default = "enabled")]
    pub auto_save: bool,
    #[serde(default = "enabled")]
    pub show_visual_markers: bool,
    #[serde(default = "enabled")]
    pub keyboard_shortcuts: bool,
}

impl Default for PageMarkSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            show_visual_markers: true,
            keyboard_shortcuts: true,
        }
    }
}
