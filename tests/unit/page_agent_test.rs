//! Unit tests for the PageAgent: saving, jumping, panel, shortcuts,
//! scrollbar indicators and the debounced auto-save.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pagemark::database::MemoryStore;
use pagemark::managers::page_agent::{PageAgent, ScrollTarget, Viewport};
use pagemark::managers::shortcut_manager::ShortcutAction;
use pagemark::services::auto_save_scheduler::DEFAULT_QUIET_PERIOD;
use pagemark::types::errors::MarkerError;
use pagemark::types::marker::AUTO_SAVE_ID;
use pagemark::types::settings::PageMarkSettings;
use serde_json::json;

const PAGE: &str = "https://example.com/long-read";

fn viewport(scroll_y: f64) -> Viewport {
    Viewport {
        scroll_x: 0.0,
        scroll_y,
        scroll_height: 5000.0,
        client_height: 1000.0,
    }
}

fn agent_with(store: &Arc<MemoryStore>, settings: PageMarkSettings) -> PageAgent {
    let mut agent = PageAgent::new(store.clone(), PAGE, "Long Read", settings, DEFAULT_QUIET_PERIOD);
    agent.load().expect("load should succeed");
    agent
}

fn agent(store: &Arc<MemoryStore>) -> PageAgent {
    agent_with(store, PageMarkSettings::default())
}

#[test]
fn test_save_current_position_uses_viewport() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);
    assert_eq!(agent.url(), PAGE);
    agent.on_resize(5000.0, 1000.0);

    let marker = agent.save_current_position(Some("Results")).unwrap().unwrap();
    assert_eq!(marker.scroll_y, 0.0);
    assert_eq!(marker.page_title, "Long Read");
    assert_eq!(agent.markers().len(), 1);
    assert_eq!(agent.indicators().len(), 1);
    assert_eq!(agent.take_notifications(), vec!["Position \"Results\" saved!".to_string()]);
    assert!(agent.take_notifications().is_empty());
}

#[test]
fn test_dismissed_prompt_saves_nothing() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);

    assert_eq!(agent.save_current_position(None).unwrap(), None);
    assert_eq!(agent.save_current_position(Some("  ")).unwrap(), None);
    assert!(agent.markers().is_empty());
}

#[test]
fn test_scroll_to_marker() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);
    let marker = agent.save_current_position(Some("Top")).unwrap().unwrap();
    agent.take_notifications();

    let target = agent.scroll_to_marker(&marker.id).unwrap();
    assert_eq!(target, ScrollTarget { scroll_x: 0.0, scroll_y: 0.0 });
    assert_eq!(agent.take_scroll_target(), Some(target));
    assert_eq!(agent.take_scroll_target(), None);
    assert_eq!(agent.take_notifications(), vec!["Scrolled to \"Top\"".to_string()]);

    assert!(matches!(agent.scroll_to_marker("missing"), Err(MarkerError::NotFound(_))));
}

#[test]
fn test_panel_toggle_and_entries() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);
    agent.save_current_position(Some("One")).unwrap();

    assert!(!agent.is_panel_visible());
    assert!(agent.toggle_panel());
    assert!(!agent.toggle_panel());

    let entries = agent.panel_entries(Utc::now());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "One");
    assert_eq!(entries[0].time_label, "Just now");
}

#[test]
fn test_indicators_follow_visual_marker_setting() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);
    agent.on_resize(3000.0, 1000.0);
    agent.save_current_position(Some("A")).unwrap();
    assert_eq!(agent.indicators()[0].fraction, 0.0);

    agent.apply_settings(PageMarkSettings { show_visual_markers: false, ..PageMarkSettings::default() });
    assert!(agent.indicators().is_empty());

    agent.apply_settings(PageMarkSettings::default());
    assert_eq!(agent.indicators().len(), 1);
}

#[test]
fn test_keyboard_shortcuts() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);

    let toggle = if cfg!(target_os = "macos") { "Cmd+Shift+L" } else { "Ctrl+Shift+L" };
    let save = if cfg!(target_os = "macos") { "cmd+shift+m" } else { "ctrl+shift+m" };

    assert_eq!(agent.handle_key(toggle), Some(ShortcutAction::TogglePanel));
    assert!(agent.is_panel_visible());
    assert_eq!(agent.handle_key(save), Some(ShortcutAction::SavePosition));
    assert_eq!(agent.handle_key("Ctrl+Alt+Q"), None);

    agent.apply_settings(PageMarkSettings { keyboard_shortcuts: false, ..PageMarkSettings::default() });
    assert_eq!(agent.handle_key(toggle), None);
    assert!(agent.is_panel_visible());
}

#[test]
fn test_handle_message_contract() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);

    let saved = agent.handle_message("savePosition", &json!({"title": "Here"})).unwrap();
    assert_eq!(saved, json!({"success": true, "saved": true}));

    let dismissed = agent.handle_message("savePosition", &json!({})).unwrap();
    assert_eq!(dismissed, json!({"success": true, "saved": false}));

    let listed = agent.handle_message("getMarkers", &json!({})).unwrap();
    let id = listed["markers"][0]["id"].as_str().unwrap().to_string();

    let missing = agent.handle_message("scrollToMarker", &json!({"markerId": "nope"})).unwrap();
    assert_eq!(missing["success"], json!(false));
    assert!(missing["error"].as_str().unwrap().contains("nope"));

    let deleted = agent.handle_message("deleteMarker", &json!({"markerId": id})).unwrap();
    assert_eq!(deleted, json!({"success": true}));
    assert!(agent.markers().is_empty());

    assert_eq!(agent.handle_message("togglePanel", &json!({})).unwrap()["visible"], json!(true));
    assert_eq!(agent.handle_message("markersAvailable", &json!({"count": 3})).unwrap(), serde_json::Value::Null);
    assert_eq!(agent.available_hint(), Some(3));

    assert!(agent.handle_message("scrollToMarker", &json!({})).is_err());
    assert!(agent.handle_message("explode", &json!({})).unwrap_err().contains("unknown action"));
}

#[test]
fn test_markers_updated_reloads_from_store() {
    let store = Arc::new(MemoryStore::new());
    let mut first = agent(&store);
    let mut second = agent(&store);

    first.save_current_position(Some("Shared")).unwrap();
    assert!(second.markers().is_empty());

    second.handle_message("markersUpdated", &json!({})).unwrap();
    assert_eq!(second.markers().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_burst_saves_once_after_quiet_period() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);

    for y in [100.0, 400.0, 900.0, 1600.0] {
        agent.on_scroll(viewport(y));
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    assert!(agent.is_auto_save_pending());
    assert!(agent.markers().is_empty());

    tokio::time::sleep(DEFAULT_QUIET_PERIOD + Duration::from_millis(100)).await;

    assert!(!agent.is_auto_save_pending());
    let markers = agent.markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, AUTO_SAVE_ID);
    assert_eq!(markers[0].scroll_y, 1600.0);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_without_auto_save_schedules_nothing() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent_with(&store, PageMarkSettings { auto_save: false, ..PageMarkSettings::default() });

    agent.on_scroll(viewport(500.0));
    assert!(!agent.is_auto_save_pending());

    tokio::time::sleep(DEFAULT_QUIET_PERIOD * 2).await;
    assert!(agent.markers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disabling_auto_save_cancels_pending() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = agent(&store);

    agent.on_scroll(viewport(500.0));
    agent.apply_settings(PageMarkSettings { auto_save: false, ..PageMarkSettings::default() });
    tokio::time::sleep(DEFAULT_QUIET_PERIOD * 2).await;

    assert!(agent.markers().is_empty());
}
