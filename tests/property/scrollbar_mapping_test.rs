//! Property-based tests for scrollbar indicator geometry.

use chrono::Utc;
use pagemark::services::scrollbar_mapping::{
    indicator_offset, scroll_fraction, ScrollMetrics, ScrollbarLayout, DEFAULT_INDICATOR_SIZE,
};
use pagemark::types::marker::Marker;
use proptest::prelude::*;

// **Fractions stay in [0, 1]**
//
// *For any* offset and container size, the fraction is within [0, 1], and
// it is 0 whenever the content does not exceed the viewport.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fraction_is_bounded(
        scroll_y in -10_000.0f64..100_000.0,
        scroll_height in 0.0f64..100_000.0,
        client_height in 0.0f64..5_000.0,
    ) {
        let fraction = scroll_fraction(scroll_y, scroll_height, client_height);
        prop_assert!((0.0..=1.0).contains(&fraction));
        if scroll_height <= client_height {
            prop_assert_eq!(fraction, 0.0);
        }
    }

    #[test]
    fn fraction_is_monotonic(
        a in 0.0f64..50_000.0,
        b in 0.0f64..50_000.0,
        client_height in 100.0f64..2_000.0,
        extra in 1.0f64..50_000.0,
    ) {
        let scroll_height = client_height + extra;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(scroll_fraction(lo, scroll_height, client_height) <= scroll_fraction(hi, scroll_height, client_height));
    }

    #[test]
    fn indicator_stays_on_track(fraction in 0.0f64..=1.0, track in 0.0f64..5_000.0) {
        let top = indicator_offset(fraction, track, DEFAULT_INDICATOR_SIZE);
        prop_assert!(top >= 0.0);
        prop_assert!(top <= (track - DEFAULT_INDICATOR_SIZE).max(0.0));
    }
}

#[test]
fn halfway_marker_sits_mid_track() {
    let marker = Marker {
        id: "1".to_string(),
        title: "Middle".to_string(),
        url: "https://a.test/".to_string(),
        scroll_y: 500.0,
        scroll_x: 0.0,
        timestamp: Utc::now(),
        page_title: String::new(),
        is_auto: false,
    };
    let metrics = ScrollMetrics { scroll_height: 2000.0, client_height: 1000.0 };

    let positions = ScrollbarLayout::default().layout(&[marker], metrics);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].fraction, 0.5);
    assert_eq!(positions[0].top, 0.5 * (1000.0 - DEFAULT_INDICATOR_SIZE));
}
