//! NamespacedStorage behaviour seen from application code.

use scopekv::{
    AuthSignal, Storage,
    auth::{begin_manual_logout, is_authenticated},
    constants::{AUTH_TOKEN, THEME, USER_EMAIL},
};
use serde_json::json;

use crate::helpers::{login_as, namespaced, seeded_store, test_store};

#[test]
fn anonymous_writes_pass_through() {
    let store = test_store();
    let storage = namespaced(&store.raw);

    storage.set_item("favorites", "[1]").unwrap();
    assert_eq!(store.raw.get_item("favorites").unwrap().as_deref(), Some("[1]"));
    assert_eq!(storage.get_item("favorites").unwrap().as_deref(), Some("[1]"));
    assert_eq!(storage.len().unwrap(), 1);
    assert!(storage.get_user_keys().is_empty());
}

#[test]
fn system_keys_stay_global_while_signed_in() {
    let store = test_store();
    let storage = namespaced(&store.raw);
    login_as(&storage, "a@x.com");
    storage.manager().refresh();

    assert!(is_authenticated(&storage));
    assert!(is_authenticated(store.raw.as_ref()));
    storage.set_item(THEME, "dark").unwrap();
    storage.set_item("cart", "[9]").unwrap();

    assert_eq!(store.raw.get_item(THEME).unwrap().as_deref(), Some("dark"));
    assert_eq!(store.raw.get_item("cart").unwrap(), None);
    assert_eq!(
        store.raw.get_item("user:a@x.com:cart").unwrap().as_deref(),
        Some("[9]")
    );
}

#[test]
fn enumeration_is_scoped_to_the_namespace() {
    let store = seeded_store(&[
        (USER_EMAIL, "a@x.com"),
        (AUTH_TOKEN, "t"),
        ("user:a@x.com:bookings", "[]"),
        ("user:a@x.com:cart", "[1]"),
        ("mapZoom", "12"),
    ]);
    let storage = namespaced(&store.raw);

    assert_eq!(storage.len().unwrap(), 2);
    assert_eq!(storage.key(0).unwrap().as_deref(), Some("bookings"));
    assert_eq!(storage.key(1).unwrap().as_deref(), Some("cart"));
    assert_eq!(storage.key(2).unwrap(), None);
    assert_eq!(storage.get_user_keys(), vec!["bookings", "cart"]);
}

#[test]
fn clear_only_touches_the_active_namespace() {
    let store = seeded_store(&[
        (USER_EMAIL, "a@x.com"),
        (AUTH_TOKEN, "t"),
        ("user:a@x.com:cart", "[1]"),
        ("user:a@x.com:favorites", "[2]"),
        (THEME, "dark"),
    ]);
    let storage = namespaced(&store.raw);
    // Another process writes for a different user after our purge.
    store.raw.set_item("user:z@x.com:cart", "[z]").unwrap();

    storage.clear().unwrap();

    assert!(storage.get_user_keys().is_empty());
    assert_eq!(
        store.raw.keys().unwrap(),
        vec![AUTH_TOKEN, THEME, "user:z@x.com:cart", USER_EMAIL]
    );
}

#[test]
fn clear_without_namespace_wipes_everything() {
    let store = seeded_store(&[(THEME, "dark"), ("favorites", "[1]")]);
    let storage = namespaced(&store.raw);
    storage.clear().unwrap();
    assert!(store.raw.is_empty().unwrap());
}

#[test]
fn export_and_import_follow_the_user() {
    let store = test_store();
    let storage = namespaced(&store.raw);
    login_as(&storage, "a@x.com");
    storage.manager().refresh();

    storage.set_item("favorites", "[1,2]").unwrap();
    storage.set_item("userNote", "plain text").unwrap();
    let exported = storage.export_user_data();
    assert_eq!(exported["favorites"], json!([1, 2]));
    assert_eq!(exported["userNote"], json!("plain text"));

    // Switch user and restore the export into the new namespace.
    login_as(&storage, "b@x.com");
    let refresh = storage
        .manager()
        .handle_signal(&AuthSignal::LoginSuccess)
        .unwrap();
    assert_eq!(refresh.purged, 2);
    assert!(storage.get_user_keys().is_empty());

    assert_eq!(storage.import_user_data(&exported), 2);
    assert_eq!(storage.get_item("favorites").unwrap().as_deref(), Some("[1,2]"));
    assert_eq!(
        store.raw.get_item("user:b@x.com:userNote").unwrap().as_deref(),
        Some("plain text")
    );
}

#[test]
fn import_without_namespace_is_refused() {
    let store = test_store();
    let storage = namespaced(&store.raw);
    let data = json!({"cart": [1]});
    assert_eq!(storage.import_user_data(data.as_object().unwrap()), 0);
    assert!(store.raw.is_empty().unwrap());
}

#[test]
fn logout_leaves_user_data_until_next_refresh() {
    let store = test_store();
    let storage = namespaced(&store.raw);
    login_as(&storage, "a@x.com");
    storage.manager().refresh();
    storage.set_item("cart", "[1]").unwrap();

    begin_manual_logout(&storage).unwrap();
    assert!(!is_authenticated(&storage));
    assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("[1]"));

    let refresh = storage.manager().handle_signal(&AuthSignal::Logout).unwrap();
    assert_eq!(refresh.namespace, None);
    assert_eq!(refresh.purged, 1);
    assert_eq!(storage.get_item("cart").unwrap(), None);
}
