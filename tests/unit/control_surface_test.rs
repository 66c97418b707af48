//! Unit tests for the popup ControlSurface.
//!
//! A recording `PageChannel` stands in for the active tab's page agent.

use std::sync::Arc;

use chrono::Utc;
use pagemark::database::MemoryStore;
use pagemark::managers::control_surface::{ControlSurface, Navigation, RECENT_LIMIT};
use pagemark::managers::marker_repository::{MarkerRepository, MarkerRepositoryTrait};
use pagemark::types::message::{PageChannel, PageMessage};
use serde_json::{json, Value};

/// Records every message and answers with a fixed reply.
struct RecordingChannel {
    sent: Vec<(String, PageMessage)>,
    reply: Result<Value, String>,
}

impl RecordingChannel {
    fn replying(reply: Result<Value, String>) -> Self {
        Self { sent: Vec::new(), reply }
    }
}

impl PageChannel for RecordingChannel {
    fn send(&mut self, url: &str, message: PageMessage) -> Result<Value, String> {
        self.sent.push((url.to_string(), message));
        self.reply.clone()
    }
}

fn seed(store: &Arc<MemoryStore>, url: &str, titles: &[&str]) -> Vec<String> {
    let mut repo = MarkerRepository::new(store.clone(), url);
    repo.load().unwrap();
    titles
        .iter()
        .map(|t| repo.create(t, 0.0, 100.0, "").unwrap().id)
        .collect()
}

#[test]
fn test_summary_lists_recent_markers() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "https://www.example.com/a", &["1", "2", "3", "4"]);
    seed(&store, "https://docs.rs/serde", &["5", "6"]);
    let surface = ControlSurface::new(store);

    let summary = surface.summary(Utc::now()).unwrap();
    assert_eq!(summary.stats.total_markers, 6);
    assert_eq!(summary.stats.total_pages, 2);
    assert_eq!(summary.recent.len(), RECENT_LIMIT);
    assert!(summary.recent.iter().all(|r| r.time_label == "Just now"));
    assert!(summary
        .recent
        .iter()
        .all(|r| r.domain == "example.com" || r.domain == "docs.rs"));
}

#[test]
fn test_summary_of_empty_store() {
    let surface = ControlSurface::new(Arc::new(MemoryStore::new()));
    let summary = surface.summary(Utc::now()).unwrap();
    assert_eq!(summary.stats.total_markers, 0);
    assert!(summary.recent.is_empty());
}

#[test]
fn test_save_position_notifies_on_success() {
    let mut surface = ControlSurface::new(Arc::new(MemoryStore::new()));
    let mut channel = RecordingChannel::replying(Ok(json!({"success": true, "saved": true})));

    assert!(surface.save_position(&mut channel, "https://a.test/", Some("Here")));
    assert_eq!(
        channel.sent,
        vec![("https://a.test/".to_string(), PageMessage::SavePosition { title: Some("Here".to_string()) })]
    );
    assert_eq!(surface.take_notifications(), vec!["Position saved successfully!".to_string()]);
}

#[test]
fn test_save_position_reports_unreachable_page() {
    let mut surface = ControlSurface::new(Arc::new(MemoryStore::new()));
    let mut channel = RecordingChannel::replying(Err("no receiver".to_string()));

    assert!(!surface.save_position(&mut channel, "https://a.test/", None));
    assert_eq!(
        surface.take_notifications(),
        vec!["Error saving position. Please refresh the page and try again.".to_string()]
    );
}

#[test]
fn test_go_to_marker_on_same_page() {
    let mut surface = ControlSurface::new(Arc::new(MemoryStore::new()));
    let mut channel = RecordingChannel::replying(Ok(json!({"success": true})));

    let nav = surface.go_to_marker(&mut channel, "42", "https://a.test/", "https://a.test/").unwrap();
    assert_eq!(nav, Navigation::SamePage);
    assert_eq!(channel.sent[0].1, PageMessage::ScrollToMarker { marker_id: "42".to_string() });
}

#[test]
fn test_go_to_marker_on_other_page_navigates_first() {
    let mut surface = ControlSurface::new(Arc::new(MemoryStore::new()));
    let mut channel = RecordingChannel::replying(Ok(json!({"success": true})));

    let nav = surface.go_to_marker(&mut channel, "42", "https://b.test/", "https://a.test/").unwrap();
    assert_eq!(
        nav,
        Navigation::Navigate {
            url: "https://b.test/".to_string(),
            then: PageMessage::ScrollToMarker { marker_id: "42".to_string() },
        }
    );
    assert!(channel.sent.is_empty());
}

#[test]
fn test_delete_marker_from_popup() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store, "https://a.test/", &["x", "y"]);
    let mut surface = ControlSurface::new(store.clone());
    let mut channel = RecordingChannel::replying(Ok(json!({"success": true})));

    // Marker on another page: store only, nothing sent.
    surface.delete_marker(&mut channel, &ids[0], "https://a.test/", "https://b.test/").unwrap();
    assert!(channel.sent.is_empty());

    // Marker on the active page: the page is told too.
    surface.delete_marker(&mut channel, &ids[1], "https://a.test/", "https://a.test/").unwrap();
    assert_eq!(channel.sent.len(), 1);

    assert_eq!(surface.summary(Utc::now()).unwrap().stats.total_markers, 0);
    assert_eq!(surface.take_notifications().len(), 2);
}

#[test]
fn test_delete_marker_with_store_down() {
    let store = Arc::new(MemoryStore::new());
    let ids = seed(&store, "https://a.test/", &["x"]);
    let mut surface = ControlSurface::new(store.clone());
    let mut channel = RecordingChannel::replying(Ok(json!({"success": true})));

    store.set_unavailable(true);
    assert!(surface.delete_marker(&mut channel, &ids[0], "https://a.test/", "https://a.test/").is_err());
    assert_eq!(surface.take_notifications(), vec!["Error deleting marker.".to_string()]);
}
