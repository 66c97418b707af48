//! Unit tests for the debounced AutoSaveScheduler, run on tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pagemark::services::auto_save_scheduler::{AutoSaveScheduler, DEFAULT_QUIET_PERIOD};

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = count.clone();
    let make = move || {
        let c = handle.clone();
        Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }) as Box<dyn FnOnce() + Send>
    };
    (count, make)
}

#[test]
fn test_default_quiet_period_is_one_second() {
    assert_eq!(AutoSaveScheduler::default().quiet_period(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_single_event_fires_after_quiet_period() {
    let (count, save) = counter();
    let mut scheduler = AutoSaveScheduler::new(DEFAULT_QUIET_PERIOD);

    scheduler.reschedule(save());
    assert!(scheduler.is_pending());

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_burst_collapses_to_one_save() {
    let (count, save) = counter();
    let mut scheduler = AutoSaveScheduler::new(DEFAULT_QUIET_PERIOD);

    for _ in 0..10 {
        scheduler.reschedule(save());
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_and_drop_abort_pending_save() {
    let (count, save) = counter();

    let mut scheduler = AutoSaveScheduler::new(DEFAULT_QUIET_PERIOD);
    scheduler.reschedule(save());
    scheduler.cancel();
    assert!(!scheduler.is_pending());

    let mut dropped = AutoSaveScheduler::new(DEFAULT_QUIET_PERIOD);
    dropped.reschedule(save());
    drop(dropped);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_save_runs_off_the_runtime_thread() {
    let runtime_thread = std::thread::current().id();
    let ran_on = Arc::new(std::sync::Mutex::new(None));
    let slot = ran_on.clone();

    let mut scheduler = AutoSaveScheduler::new(DEFAULT_QUIET_PERIOD);
    scheduler.reschedule(move || {
        *slot.lock().unwrap() = Some(std::thread::current().id());
    });

    tokio::time::sleep(DEFAULT_QUIET_PERIOD * 2).await;
    let ran_on = ran_on.lock().unwrap().expect("save should have run");
    assert_ne!(ran_on, runtime_thread);
}
