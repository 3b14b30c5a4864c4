use std::sync::Arc;
use std::time::Duration;

use scopekv::{
    Clock, Config, InMemory, JsonFile, NamespacedStorage, SessionEvent, Storage,
    auth::store_login, namespace::SessionContext, profile::UserProfile,
};
use tempfile::TempDir;
use tokio::sync::broadcast::{Receiver, error::TryRecvError};

// ==========================
// CORE TEST FACTORIES
// ==========================

/// A raw store for a test, plus whatever must outlive it.
pub struct TestStore {
    pub raw: Arc<dyn Storage>,
    _dir: Option<TempDir>,
}

/// Creates a raw store based on the TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "jsonfile": JsonFile backend in a fresh temporary directory
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests against the file-backed store
/// TEST_BACKEND=jsonfile cargo test
/// ```
pub fn test_store() -> TestStore {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("jsonfile") => {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let raw: Arc<dyn Storage> = Arc::new(JsonFile::open(dir.path().join("store.json")));
            TestStore {
                raw,
                _dir: Some(dir),
            }
        }
        Ok("inmemory") | Err(_) => TestStore {
            raw: Arc::new(InMemory::new()),
            _dir: None,
        },
        Ok(other) => panic!("Unknown TEST_BACKEND: {other}"),
    }
}

/// Creates a raw store pre-populated with `items`.
pub fn seeded_store(items: &[(&str, &str)]) -> TestStore {
    let store = test_store();
    for (key, value) in items {
        store
            .raw
            .set_item(key, value)
            .expect("Failed to seed store");
    }
    store
}

/// Installs namespaced storage over `raw` with a fresh context.
pub fn namespaced(raw: &Arc<dyn Storage>) -> NamespacedStorage {
    NamespacedStorage::new(raw.clone(), Arc::new(SessionContext::new()))
}

/// Writes a verified login for `email`.
pub fn login_as(storage: &dyn Storage, email: &str) {
    store_login(storage, "test-token", &UserProfile::new(email, true)).expect("Failed to log in");
}

/// Profile blob as the login flow stores it.
pub fn profile_json(email: &str) -> String {
    format!(r#"{{"email":"{email}","isVerified":true}}"#)
}

// ==========================
// TIME
// ==========================

/// Default config with a custom idle timeout.
pub fn watcher_config(idle_timeout: Duration) -> Config {
    Config {
        idle_timeout,
        ..Config::default()
    }
}

/// Clock following tokio's (pausable) time.
///
/// Under `#[tokio::test(start_paused = true)]` tokio skips ahead whenever every
/// task is idle, so the watcher's idle and debounce deadlines elapse instantly
/// while still being measured by the monitor's clock.
#[derive(Debug)]
pub struct TokioClock {
    start: tokio::time::Instant,
    base_millis: u64,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            start: tokio::time::Instant::now(),
            base_millis: 1_704_067_200_000,
        }
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> u64 {
        self.base_millis + self.start.elapsed().as_millis() as u64
    }
}

// ==========================
// EVENTS
// ==========================

/// Waits for the next event, failing the test after `within`.
pub async fn next_event(rx: &mut Receiver<SessionEvent>, within: Duration) -> SessionEvent {
    tokio::time::timeout(within, rx.recv())
        .await
        .expect("Timed out waiting for session event")
        .expect("Event bus closed")
}

/// Collects every event already delivered.
pub fn drain(rx: &mut Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => out.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    out
}

/// Names of `events`, in order.
pub fn names(events: &[SessionEvent]) -> Vec<&'static str> {
    events.iter().map(SessionEvent::name).collect()
}
