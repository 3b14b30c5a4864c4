//! Namespace resolution, classification, migration and purging.

use std::sync::Arc;

use scopekv::{
    AuthSignal, KeyClass, Namespace, Storage, classify,
    constants::{AUTH_TOKEN, SYSTEM_KEYS, THEME, USER_EMAIL, USER_PROFILE},
    namespace::{NamespaceManager, SessionContext, to_logical_key, to_physical_key},
};

use crate::helpers::{profile_json, seeded_store};

fn manager(raw: &Arc<dyn Storage>) -> NamespaceManager {
    NamespaceManager::new(raw.clone(), Arc::new(SessionContext::new()))
}

fn ns(id: &str) -> Namespace {
    Namespace::for_identifier(id).unwrap()
}

#[test]
fn classification_precedence() {
    for key in SYSTEM_KEYS {
        assert_eq!(classify(key), KeyClass::System);
    }
    assert_eq!(classify("favorites"), KeyClass::UserData);
    assert_eq!(classify("userSavedListings"), KeyClass::UserPattern);
    assert_eq!(classify("lastBookingDraft"), KeyClass::UserPattern);
    assert_eq!(classify("mapZoom"), KeyClass::Shared);
    assert_eq!(classify(""), KeyClass::Shared);
}

#[test]
fn translation_round_trips_for_namespaced_keys() {
    let namespace = ns("a@x.com");
    for key in ["favorites", "userSavedListings", "recentHistory", "cart"] {
        let physical = to_physical_key(key, Some(&namespace));
        assert_eq!(physical, format!("user:a@x.com:{key}"));
        assert_eq!(to_logical_key(&physical, Some(&namespace)), key);
    }
    for key in [AUTH_TOKEN, THEME, "mapZoom"] {
        assert_eq!(to_physical_key(key, Some(&namespace)), key);
    }
    assert_eq!(to_physical_key("favorites", None), "favorites");
}

#[test]
fn resolution_prefers_profile_and_survives_garbage() {
    let store = seeded_store(&[
        (USER_PROFILE, profile_json("profile@x.com").as_str()),
        (USER_EMAIL, "email@x.com"),
    ]);
    let manager = manager(&store.raw);
    assert_eq!(manager.resolve_namespace(), Some(ns("profile@x.com")));
    assert_eq!(manager.resolve_namespace(), manager.resolve_namespace());

    store.raw.set_item(USER_PROFILE, "{not json").unwrap();
    assert_eq!(manager.resolve_namespace(), Some(ns("email@x.com")));

    store.raw.set_item(USER_EMAIL, "   ").unwrap();
    assert_eq!(manager.resolve_namespace(), None);
}

#[test]
fn migration_is_idempotent_and_non_destructive() {
    let store = seeded_store(&[
        ("favorites", "[legacy]"),
        ("userSavedListings", "[1,2]"),
        ("user:a@x.com:favorites", "[newer]"),
        ("mapZoom", "12"),
        (USER_EMAIL, "a@x.com"),
    ]);
    let manager = manager(&store.raw);
    let refresh = manager.refresh();
    assert_eq!(refresh.migrated, 1);

    let before: Vec<_> = store
        .raw
        .keys()
        .unwrap()
        .into_iter()
        .map(|k| (k.clone(), store.raw.get_item(&k).unwrap()))
        .collect();
    assert_eq!(manager.migrate_legacy_keys(&ns("a@x.com")), 0);
    let after: Vec<_> = store
        .raw
        .keys()
        .unwrap()
        .into_iter()
        .map(|k| (k.clone(), store.raw.get_item(&k).unwrap()))
        .collect();
    assert_eq!(before, after);

    let get = |k: &str| store.raw.get_item(k).unwrap();
    assert_eq!(get("user:a@x.com:favorites").as_deref(), Some("[newer]"));
    assert_eq!(get("user:a@x.com:userSavedListings").as_deref(), Some("[1,2]"));
    assert_eq!(get("user:a@x.com:mapZoom"), None);
}

#[test]
fn migration_refuses_inactive_namespace() {
    let store = seeded_store(&[("cart", "[1]"), (USER_EMAIL, "a@x.com")]);
    let manager = manager(&store.raw);
    manager.refresh();
    assert_eq!(manager.migrate_legacy_keys(&ns("b@x.com")), 0);
    assert_eq!(store.raw.get_item("user:b@x.com:cart").unwrap(), None);
}

#[test]
fn purge_keeps_only_the_active_namespace() {
    let store = seeded_store(&[
        ("user:a@x.com:cart", "[1]"),
        ("user:b@x.com:cart", "[2]"),
        ("user:c@x.com:wishlist", "[3]"),
        (AUTH_TOKEN, "t"),
        (THEME, "dark"),
    ]);
    let manager = manager(&store.raw);

    assert_eq!(manager.purge_stale_namespaces(Some(&ns("b@x.com"))), 2);
    let keys = store.raw.keys().unwrap();
    assert_eq!(keys, vec![AUTH_TOKEN, THEME, "user:b@x.com:cart"]);

    assert_eq!(manager.purge_stale_namespaces(None), 1);
    assert!(store
        .raw
        .keys()
        .unwrap()
        .iter()
        .all(|k| !Namespace::is_namespaced_key(k)));
}

#[test]
fn switching_users_purges_then_migrates() {
    let store = seeded_store(&[
        ("user:a@x.com:cart", "[a]"),
        ("wishlist", "[legacy]"),
        (USER_EMAIL, "a@x.com"),
    ]);
    let manager = manager(&store.raw);
    let first = manager.refresh();
    assert!(first.changed);
    assert_eq!(first.migrated, 1);

    store.raw.set_item(USER_EMAIL, "b@x.com").unwrap();
    let second = manager
        .handle_signal(&AuthSignal::StorageChanged {
            key: Some(USER_EMAIL.to_string()),
        })
        .unwrap();
    assert!(second.changed);
    assert_eq!(second.namespace, Some(ns("b@x.com")));
    assert_eq!(second.purged, 2);
    assert_eq!(second.migrated, 1);
    assert_eq!(
        store.raw.get_item("user:b@x.com:wishlist").unwrap().as_deref(),
        Some("[legacy]")
    );
    assert_eq!(store.raw.get_item("user:a@x.com:cart").unwrap(), None);
}

#[test]
fn unrelated_signals_do_not_refresh() {
    let store = seeded_store(&[(USER_EMAIL, "a@x.com")]);
    let manager = manager(&store.raw);
    assert!(manager
        .handle_signal(&AuthSignal::StorageChanged {
            key: Some("mapZoom".to_string()),
        })
        .is_none());
    assert!(manager
        .handle_signal(&AuthSignal::HttpResponse {
            status: 500,
            path: "/api/listings".to_string(),
        })
        .is_none());
    assert_eq!(manager.current(), None);
}
