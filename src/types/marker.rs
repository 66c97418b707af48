use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ID of the single auto-saved "last position" marker on each page.
pub const AUTO_SAVE_ID: &str = "auto-save";

/// Display title of the auto-saved marker.
pub const AUTO_SAVE_TITLE: &str = "Last Position";

/// Format version written into export files.
pub const EXPORT_VERSION: &str = "1.0.0";

/// A saved scroll position on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub title: String,
    pub url: String,
    pub scroll_y: f64,
    pub scroll_x: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub page_title: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_auto: bool,
}

impl Marker {
    /// Builds the sentinel auto-save marker for `url`.
    pub fn auto_save(url: &str, scroll_x: f64, scroll_y: f64, page_title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: AUTO_SAVE_ID.to_string(),
            title: AUTO_SAVE_TITLE.to_string(),
            url: url.to_string(),
            scroll_y: clamp_offset(scroll_y),
            scroll_x: clamp_offset(scroll_x),
            timestamp: now,
            page_title: page_title.to_string(),
            is_auto: true,
        }
    }
}

/// Ordered markers for one URL.
pub type MarkerCollection = Vec<Marker>;

/// Every page's markers, keyed by URL.
pub type MarkerStore = BTreeMap<String, MarkerCollection>;

/// Whole-store snapshot written by export and accepted by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub markers: MarkerStore,
}

/// Aggregate counts shown in the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStats {
    pub total_markers: usize,
    pub total_pages: usize,
    #[serde(rename = "totalStorageKB")]
    pub total_storage_kb: u64,
}

/// Scroll offsets are never negative; NaN collapses to the top of the page.
pub fn clamp_offset(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Generates a marker ID from the creation instant (Unix milliseconds).
///
/// Bumps the value until it is free in `existing`, so two markers created
/// within the same millisecond still get distinct IDs.
pub fn generate_marker_id(existing: &[Marker], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !existing.iter().any(|m| m.id == id) {
            return id;
        }
        candidate += 1;
    }
}

/// Short relative label for a marker timestamp ("Just now", "5m ago", "3h ago", or the date).
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp).num_milliseconds();
    if diff < 60_000 {
        "Just now".to_string()
    } else if diff < 3_600_000 {
        format!("{}m ago", diff / 60_000)
    } else if diff < 86_400_000 {
        format!("{}h ago", diff / 3_600_000)
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
