//! Control Surface (popup) for PageMark.
//!
//! Builds the cross-page summary (statistics and recent markers) and turns
//! popup actions into messages for the active page.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::marker_library::{MarkerLibrary, MarkerLibraryTrait};
use crate::database::store::KeyValueStore;
use crate::types::errors::MarkerError;
use crate::types::marker::{format_relative_time, MarkerStats};
use crate::types::message::{PageChannel, PageMessage};

/// Number of markers listed under "recent" in the popup.
pub const RECENT_LIMIT: usize = 5;

/// Hosts shown under a friendly name instead of their domain.
const KNOWN_HOSTS: &[(&str, &str)] = &[
    ("chat.openai.com", "ChatGPT"),
    ("gemini.google.com", "Gemini"),
    ("claude.ai", "Claude"),
    ("bard.google.com", "Bard"),
];

/// One entry of the popup's recent-markers list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMarker {
    pub id: String,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub time_label: String,
}

/// Everything the popup shows when opened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupSummary {
    pub stats: MarkerStats,
    pub recent: Vec<RecentMarker>,
}

/// What the popup did to reach a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// The marker is on the active page; a scroll request was sent.
    SamePage,
    /// The tab must load `url` first; `then` is sent once loading completes.
    Navigate { url: String, then: PageMessage },
}

/// Display label for a page URL: the host without `www.`, or a friendly
/// name for well-known chat sites.
pub fn display_domain(page_url: &str) -> String {
    let host = match url::Url::parse(page_url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host,
        None => return "Unknown page".to_string(),
    };
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    KNOWN_HOSTS
        .iter()
        .find(|(known, _)| host.contains(known))
        .map(|(_, name)| name.to_string())
        .unwrap_or(host)
}

/// Popup logic bound to the shared store.
pub struct ControlSurface {
    library: MarkerLibrary,
    notifications: Vec<String>,
}

impl ControlSurface {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            library: MarkerLibrary::new(store),
            notifications: Vec::new(),
        }
    }

    /// Statistics plus the newest markers across all pages.
    pub fn summary(&self, now: DateTime<Utc>) -> Result<PopupSummary, MarkerError> {
        let stats = self.library.stats()?;
        let recent = self
            .library
            .recent(RECENT_LIMIT)?
            .into_iter()
            .map(|m| RecentMarker {
                domain: display_domain(&m.url),
                time_label: format_relative_time(m.timestamp, now),
                id: m.id,
                title: m.title,
                url: m.url,
            })
            .collect();
        Ok(PopupSummary { stats, recent })
    }

    /// Asks the active page to save its position under `title`.
    pub fn save_position(&mut self, channel: &mut dyn PageChannel, active_url: &str, title: Option<&str>) -> bool {
        let message = PageMessage::SavePosition { title: title.map(str::to_string) };
        match channel.send(active_url, message) {
            Ok(response) if response_succeeded(&response) => {
                if response.get("saved").and_then(Value::as_bool).unwrap_or(true) {
                    self.notify("Position saved successfully!");
                }
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::error!(error = %e, "error saving position");
                self.notify("Error saving position. Please refresh the page and try again.");
                false
            }
        }
    }

    /// Asks the active page to show its marker panel.
    pub fn show_markers(&mut self, channel: &mut dyn PageChannel, active_url: &str) -> bool {
        match channel.send(active_url, PageMessage::TogglePanel) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "error showing markers");
                self.notify("Error showing markers. Please refresh the page and try again.");
                false
            }
        }
    }

    /// Jumps to a marker, navigating the tab first when it is on another page.
    pub fn go_to_marker(
        &mut self,
        channel: &mut dyn PageChannel,
        marker_id: &str,
        marker_url: &str,
        active_url: &str,
    ) -> Result<Navigation, String> {
        let scroll = PageMessage::ScrollToMarker { marker_id: marker_id.to_string() };
        if marker_url != active_url {
            return Ok(Navigation::Navigate { url: marker_url.to_string(), then: scroll });
        }
        channel.send(active_url, scroll).map(|_| Navigation::SamePage).inspect_err(|e| {
            tracing::error!(error = %e, "error going to marker");
            self.notify("Error navigating to marker.");
        })
    }

    /// Deletes a marker from the store; also tells the active page when the
    /// marker lives there so its indicator disappears.
    pub fn delete_marker(
        &mut self,
        channel: &mut dyn PageChannel,
        marker_id: &str,
        marker_url: &str,
        active_url: &str,
    ) -> Result<(), MarkerError> {
        if let Err(e) = self.library.delete_marker(marker_url, marker_id) {
            tracing::error!(error = %e, "error deleting marker");
            self.notify("Error deleting marker.");
            return Err(e);
        }
        if marker_url == active_url {
            let message = PageMessage::DeleteMarker { marker_id: marker_id.to_string() };
            if let Err(e) = channel.send(active_url, message) {
                tracing::warn!(error = %e, "page did not acknowledge delete");
            }
        }
        self.notify("Marker deleted successfully!");
        Ok(())
    }

    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}

fn response_succeeded(response: &Value) -> bool {
    response.get("success").and_then(Value::as_bool).unwrap_or(false)
}
