//! Per-user storage namespaces
//!
//! A namespace is the prefix `user:<identifier>:` placed in front of every
//! per-user key, so several accounts signing in on the same device never see
//! each other's data. This module contains:
//!
//! * [`Namespace`]: the prefix value type.
//! * [`classify`] and the key translation functions: which keys get the prefix.
//! * [`SessionContext`]: the active namespace and its migration flag.
//! * [`NamespaceManager`]: resolution from the stored identity, legacy key
//!   migration, and purging of other users' data.

use std::fmt;

use crate::constants::{NAMESPACE_PREFIX, NAMESPACE_SEPARATOR};

mod classify;
mod context;
mod manager;

pub use classify::{KeyClass, classify, to_logical_key, to_physical_key};
pub use context::SessionContext;
pub use manager::{NamespaceManager, NamespaceRefresh};

/// A per-user key prefix of the form `user:<identifier>:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Builds the namespace for a user identifier.
    ///
    /// Surrounding whitespace is ignored; a blank identifier has no namespace.
    pub fn for_identifier(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }
        Some(Self(format!(
            "{NAMESPACE_PREFIX}{identifier}{NAMESPACE_SEPARATOR}"
        )))
    }

    /// Splits a stored key into its namespace and logical key.
    ///
    /// Returns `None` for keys that are not namespaced.
    pub fn parse(physical: &str) -> Option<(Namespace, &str)> {
        let rest = physical.strip_prefix(NAMESPACE_PREFIX)?;
        let end = rest.find(NAMESPACE_SEPARATOR)?;
        if end == 0 {
            return None;
        }
        let prefix_len = NAMESPACE_PREFIX.len() + end + NAMESPACE_SEPARATOR.len_utf8();
        Some((
            Namespace(physical[..prefix_len].to_string()),
            &physical[prefix_len..],
        ))
    }

    /// Whether `physical` is a namespaced key (of any user).
    pub fn is_namespaced_key(physical: &str) -> bool {
        Self::parse(physical).is_some()
    }

    /// The full prefix, e.g. `user:a@x.com:`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier between the prefix and the separator.
    pub fn identifier(&self) -> &str {
        &self.0[NAMESPACE_PREFIX.len()..self.0.len() - NAMESPACE_SEPARATOR.len_utf8()]
    }

    /// Whether `physical` belongs to this namespace.
    pub fn owns(&self, physical: &str) -> bool {
        physical.starts_with(&self.0)
    }

    /// Prefixes a logical key.
    pub fn qualify(&self, logical: &str) -> String {
        format!("{}{logical}", self.0)
    }

    /// Strips this namespace from a stored key.
    pub fn strip<'a>(&self, physical: &'a str) -> Option<&'a str> {
        physical.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
