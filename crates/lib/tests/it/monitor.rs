//! The session watcher task, driven through SessionRuntime.
//!
//! These tests run on paused tokio time with [`TokioClock`], so idle timeouts
//! measured in minutes elapse instantly.

use std::sync::Arc;
use std::time::Duration;

use scopekv::{
    AuthSignal, SessionEvent, SessionRuntime, Storage,
    auth::begin_manual_logout,
    constants::{AUTH_TOKEN, USER_EMAIL, USER_PROFILE},
    events::{ActivityKind, AuthErrorKind, LogoutReason},
};

use crate::helpers::{
    TokioClock, drain, login_as, next_event, profile_json, test_store, watcher_config,
};

const IDLE: Duration = Duration::from_secs(10 * 60);
const WAIT: Duration = Duration::from_secs(60 * 60);

fn open(raw: &Arc<dyn Storage>) -> SessionRuntime {
    SessionRuntime::open_with_clock(raw.clone(), watcher_config(IDLE), Arc::new(TokioClock::new()))
        .expect("Failed to open runtime")
}

#[tokio::test(start_paused = true)]
async fn login_then_idle_timeout() {
    let store = test_store();
    let runtime = open(&store.raw);
    let mut events = runtime.subscribe();
    let handle = runtime.start_watcher().unwrap();

    login_as(store.raw.as_ref(), "a@x.com");
    let login = next_event(&mut events, WAIT).await;
    assert!(matches!(
        login,
        SessionEvent::Login { identifier: Some(ref id), .. } if id == "a@x.com"
    ));
    runtime.storage().set_item("cart", "[1]").unwrap();

    let started = tokio::time::Instant::now();
    let expired = next_event(&mut events, WAIT).await;
    assert!(started.elapsed() >= IDLE);
    match expired {
        SessionEvent::SystemLogout(detail) => {
            assert_eq!(detail.reason, LogoutReason::SessionExpired);
        }
        other => panic!("expected system-logout, got {other:?}"),
    }

    for key in [AUTH_TOKEN, USER_EMAIL, USER_PROFILE] {
        assert_eq!(store.raw.get_item(key).unwrap(), None, "{key} not cleared");
    }
    assert_eq!(runtime.namespaced().namespace(), None);
    assert_eq!(store.raw.get_item("user:a@x.com:cart").unwrap(), None);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn activity_keeps_the_session_alive() {
    let store = test_store();
    let runtime = open(&store.raw);
    let mut events = runtime.subscribe();
    let handle = runtime.start_watcher().unwrap();

    login_as(store.raw.as_ref(), "a@x.com");
    next_event(&mut events, WAIT).await;

    for _ in 0..3 {
        tokio::time::sleep(IDLE / 2).await;
        handle
            .signal(AuthSignal::UserActivity(ActivityKind::PointerDown))
            .await
            .unwrap();
    }
    // 1.5x the idle timeout has passed without an expiry.
    assert!(events.try_recv().is_err());
    assert_eq!(store.raw.get_item(AUTH_TOKEN).unwrap().as_deref(), Some("test-token"));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn manual_logout_is_reported_as_such() {
    let store = test_store();
    let runtime = open(&store.raw);
    let mut events = runtime.subscribe();
    let handle = runtime.start_watcher().unwrap();

    login_as(store.raw.as_ref(), "a@x.com");
    next_event(&mut events, WAIT).await;

    begin_manual_logout(runtime.storage().as_ref()).unwrap();
    handle.signal(AuthSignal::ManualLogout).await.unwrap();

    let event = next_event(&mut events, WAIT).await;
    assert!(matches!(event, SessionEvent::ManualLogout { .. }));
    assert_eq!(runtime.namespaced().namespace(), None);

    // Nothing else follows, not even after the idle timeout.
    tokio::time::sleep(IDLE * 2).await;
    assert!(events.try_recv().is_err());
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unauthorized_response_expires_the_session() {
    let store = test_store();
    let runtime = open(&store.raw);
    let mut events = runtime.subscribe();
    let handle = runtime.start_watcher().unwrap();

    login_as(store.raw.as_ref(), "a@x.com");
    next_event(&mut events, WAIT).await;

    handle
        .signal(AuthSignal::HttpResponse {
            status: 401,
            path: "/api/auth/login".to_string(),
        })
        .await
        .unwrap();
    handle
        .signal(AuthSignal::HttpResponse {
            status: 401,
            path: "/api/bookings".to_string(),
        })
        .await
        .unwrap();

    let started = tokio::time::Instant::now();
    let error = next_event(&mut events, WAIT).await;
    assert!(started.elapsed() >= Duration::from_millis(500));
    match error {
        SessionEvent::AuthError(notice) => assert_eq!(notice.kind, AuthErrorKind::ApiUnauthorized),
        other => panic!("expected auth-error, got {other:?}"),
    }

    let logout = next_event(&mut events, WAIT).await;
    assert!(matches!(
        logout,
        SessionEvent::SystemLogout(ref detail) if detail.reason == LogoutReason::TokenExpired
    ));
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_watcher() {
    let store = test_store();
    let runtime = open(&store.raw);
    let mut events = runtime.subscribe();

    let handle = runtime.start_watcher().unwrap();
    assert!(handle.is_running());
    drop(handle);
    assert!(!runtime.is_watching());

    login_as(store.raw.as_ref(), "a@x.com");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(events.try_recv().is_err());

    // A new watcher adopts the existing session without a login event.
    let handle = runtime.start_watcher().unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(events.try_recv().is_err());
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn user_switch_under_a_live_session_moves_namespace_on_poll() {
    let store = test_store();
    let runtime = open(&store.raw);
    let mut events = runtime.subscribe();
    let handle = runtime.start_watcher().unwrap();

    login_as(store.raw.as_ref(), "a@x.com");
    next_event(&mut events, WAIT).await;
    runtime.storage().set_item("cart", "[\"a\"]").unwrap();

    // Another writer signs in as b without the session ever going away.
    store.raw.set_item(USER_EMAIL, "b@x.com").unwrap();
    store
        .raw
        .set_item(USER_PROFILE, &profile_json("b@x.com"))
        .unwrap();
    tokio::time::sleep(runtime.config().poll_interval * 2).await;

    assert_eq!(
        runtime.namespaced().namespace().map(|ns| ns.to_string()),
        Some("user:b@x.com:".to_string())
    );
    assert_eq!(runtime.storage().get_item("cart").unwrap(), None);
    assert_eq!(store.raw.get_item("user:a@x.com:cart").unwrap(), None);
    // Liveness never dropped, so nothing was broadcast.
    assert!(drain(&mut events).is_empty());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn profile_change_signal_moves_namespace_before_next_poll() {
    let store = test_store();
    login_as(store.raw.as_ref(), "a@x.com");
    let config = scopekv::Config {
        poll_interval: IDLE / 2,
        ..watcher_config(IDLE)
    };
    let runtime =
        SessionRuntime::open_with_clock(store.raw.clone(), config, Arc::new(TokioClock::new()))
            .unwrap();
    let handle = runtime.start_watcher().unwrap();
    runtime.storage().set_item("favorites", "[1]").unwrap();

    store
        .raw
        .set_item(USER_PROFILE, &profile_json("b@x.com"))
        .unwrap();
    handle
        .signal(AuthSignal::StorageChanged {
            key: Some(USER_PROFILE.to_string()),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        runtime.namespaced().namespace().map(|ns| ns.to_string()),
        Some("user:b@x.com:".to_string())
    );
    assert_eq!(runtime.storage().get_item("favorites").unwrap(), None);

    handle.shutdown().await.unwrap();
}
