//! Property-based tests for MarkerRepository operations.
//!
//! These tests verify ID uniqueness on create, the single-sentinel rule for
//! auto-save, deleting unknown IDs, and that a failing store never changes
//! the in-memory collection.

use std::sync::Arc;

use pagemark::database::{KeyValueStore, MemoryStore, MARKERS_KEY};
use pagemark::managers::marker_repository::{MarkerRepository, MarkerRepositoryTrait};
use pagemark::types::marker::AUTO_SAVE_ID;
use proptest::prelude::*;

/// Strategy for page URLs.
fn arb_url() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9]{2,12}", proptest::option::of("/[a-z0-9]{1,10}"))
        .prop_map(|(host, path)| format!("https://{}.test{}", host, path.unwrap_or_default()))
}

/// Strategy for non-blank marker titles.
fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,30}"
}

fn repository(url: &str) -> (Arc<MemoryStore>, MarkerRepository) {
    let store = Arc::new(MemoryStore::new());
    let mut repo = MarkerRepository::new(store.clone(), url);
    repo.load().expect("load should succeed");
    (store, repo)
}

// **Create yields unique IDs**
//
// *For any* sequence of titles and offsets, every created marker gets an ID
// not shared with any other marker, and all of them are retained in order.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn create_ids_are_unique(
        url in arb_url(),
        entries in prop::collection::vec((arb_title(), 0.0f64..100_000.0), 1..20),
    ) {
        let (_store, mut repo) = repository(&url);

        for (title, y) in &entries {
            let marker = repo.create(title, 0.0, *y, "").expect("create should succeed");
            prop_assert_eq!(&marker.title, title);
            prop_assert_eq!(marker.scroll_y, *y);
        }

        let mut ids: Vec<&str> = repo.list().iter().map(|m| m.id.as_str()).collect();
        prop_assert_eq!(ids.len(), entries.len());
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), entries.len());
    }
}

// **Auto-save keeps exactly one sentinel**
//
// *For any* interleaving of creates and auto-saves, the collection contains
// at most one auto-save marker, and it holds the last auto-saved offset.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn auto_save_keeps_one_sentinel(
        ops in prop::collection::vec(prop_oneof![
            (0.0f64..50_000.0).prop_map(Some),
            Just(None),
        ], 1..25),
    ) {
        let (_store, mut repo) = repository("https://page.test/");
        let mut last_auto = None;

        for op in &ops {
            match op {
                Some(y) => {
                    repo.auto_save(0.0, *y, "").expect("auto_save should succeed");
                    last_auto = Some(*y);
                }
                None => {
                    repo.create("user", 0.0, 1.0, "").expect("create should succeed");
                }
            }
        }

        let autos: Vec<_> = repo.list().iter().filter(|m| m.id == AUTO_SAVE_ID).collect();
        match last_auto {
            Some(y) => {
                prop_assert_eq!(autos.len(), 1);
                prop_assert_eq!(autos[0].scroll_y, y);
            }
            None => prop_assert!(autos.is_empty()),
        }
        let users = ops.iter().filter(|op| op.is_none()).count();
        prop_assert_eq!(repo.list().len(), users + usize::from(last_auto.is_some()));
    }
}

// **Deleting an unknown ID changes nothing**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn delete_unknown_id_is_noop(
        titles in prop::collection::vec(arb_title(), 0..8),
        missing in "[a-z]{5,10}",
    ) {
        let (_store, mut repo) = repository("https://page.test/");
        for title in &titles {
            repo.create(title, 0.0, 10.0, "").expect("create should succeed");
        }
        let before = repo.list().to_vec();

        repo.delete(&missing).expect("delete should succeed");
        prop_assert_eq!(repo.list(), before.as_slice());
    }
}

// **A failing store leaves state unchanged**
//
// *For any* existing collection, create/autoSave/delete against an
// unavailable store fail and leave both memory and storage as they were.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn failing_store_leaves_state_unchanged(
        titles in prop::collection::vec(arb_title(), 1..6),
        new_title in arb_title(),
    ) {
        let (store, mut repo) = repository("https://page.test/");
        for title in &titles {
            repo.create(title, 0.0, 10.0, "").expect("create should succeed");
        }
        let memory_before = repo.list().to_vec();
        let stored_before = store.get(MARKERS_KEY).expect("get should succeed");
        let first_id = memory_before[0].id.clone();

        store.set_unavailable(true);
        prop_assert!(repo.create(&new_title, 0.0, 5.0, "").is_err());
        prop_assert!(repo.auto_save(0.0, 5.0, "").is_err());
        prop_assert!(repo.delete(&first_id).is_err());
        store.set_unavailable(false);

        prop_assert_eq!(repo.list(), memory_before.as_slice());
        prop_assert_eq!(store.get(MARKERS_KEY).expect("get should succeed"), stored_before);
    }
}
