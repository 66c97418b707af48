// PageMark scrollbar indicator placement
// Maps a marker's stored scroll offset onto the visible scrollbar track.

use serde::Serialize;

use crate::types::marker::Marker;

/// Rendered height of one scrollbar indicator, in CSS pixels.
pub const DEFAULT_INDICATOR_SIZE: f64 = 40.0;

/// Dimensions of the scroll container at the time of layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub client_height: f64,
}

/// Where one marker's indicator sits on the track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorPosition {
    pub marker_id: String,
    pub title: String,
    pub fraction: f64,
    pub top: f64,
}

/// Fraction of the scrollable range that `scroll_y` represents, in [0, 1].
///
/// Content no taller than the viewport has no scrollable range; the
/// fraction is 0 in that case.
pub fn scroll_fraction(scroll_y: f64, scroll_height: f64, client_height: f64) -> f64 {
    let range = scroll_height - client_height;
    if !(range > 0.0) {
        return 0.0;
    }
    let fraction = scroll_y / range;
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Top offset of an indicator on a track, keeping the indicator fully inside it.
pub fn indicator_offset(fraction: f64, track_height: f64, indicator_size: f64) -> f64 {
    fraction * (track_height - indicator_size).max(0.0)
}

/// Computes indicator positions for a page's markers.
#[derive(Debug, Clone, Copy)]
pub struct ScrollbarLayout {
    pub indicator_size: f64,
}

impl Default for ScrollbarLayout {
    fn default() -> Self {
        Self { indicator_size: DEFAULT_INDICATOR_SIZE }
    }
}

impl ScrollbarLayout {
    /// One position per marker, in collection order. The track is the viewport.
    pub fn layout(&self, markers: &[Marker], metrics: ScrollMetrics) -> Vec<IndicatorPosition> {
        markers
            .iter()
            .map(|marker| {
                let fraction = scroll_fraction(marker.scroll_y, metrics.scroll_height, metrics.client_height);
                IndicatorPosition {
                    marker_id: marker.id.clone(),
                    title: marker.title.clone(),
                    fraction,
                    top: indicator_offset(fraction, metrics.client_height, self.indicator_size),
                }
            })
            .collect()
    }
}
