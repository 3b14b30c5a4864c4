//! Key classification and logical/physical key translation.
//!
//! Classification is a pure function of the key string. The system allow-list
//! is checked first so authentication keys can never be namespaced, even when
//! their names look like per-user data (`userProfile`).

use std::borrow::Cow;

use super::Namespace;
use crate::constants::{SYSTEM_KEYS, USER_DATA_FRAGMENTS, USER_DATA_KEY_PREFIX, USER_DATA_KEYS};

/// Category of a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    /// Registered system key; never namespaced.
    System,
    /// Registered per-user key; always namespaced.
    UserData,
    /// Unregistered key whose name looks per-user; namespaced.
    UserPattern,
    /// Unregistered key with no per-user markers; shared by everyone.
    Shared,
}

impl KeyClass {
    /// Whether keys of this class live under the active namespace.
    pub fn is_namespaced(self) -> bool {
        matches!(self, KeyClass::UserData | KeyClass::UserPattern)
    }
}

/// Classify a logical key.
pub fn classify(key: &str) -> KeyClass {
    if SYSTEM_KEYS.contains(&key) {
        KeyClass::System
    } else if USER_DATA_KEYS.contains(&key) {
        KeyClass::UserData
    } else if key.starts_with(USER_DATA_KEY_PREFIX)
        || USER_DATA_FRAGMENTS.iter().any(|f| key.contains(f))
    {
        KeyClass::UserPattern
    } else {
        KeyClass::Shared
    }
}

/// Translate a logical key to the key actually stored.
///
/// The key is returned unchanged when no namespace is active or when it is not
/// namespaced by [`classify`].
pub fn to_physical_key<'a>(logical: &'a str, namespace: Option<&Namespace>) -> Cow<'a, str> {
    match namespace {
        Some(ns) if classify(logical).is_namespaced() => Cow::Owned(ns.qualify(logical)),
        _ => Cow::Borrowed(logical),
    }
}

/// Translate a stored key back to its logical form.
///
/// Strips `namespace` when the key carries it; anything else is returned as is.
pub fn to_logical_key<'a>(physical: &'a str, namespace: Option<&Namespace>) -> &'a str {
    namespace
        .and_then(|ns| ns.strip(physical))
        .unwrap_or(physical)
}
