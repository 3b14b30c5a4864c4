//! Session keys written by the authentication flow.
//!
//! The login and logout screens only ever touch system keys, so these helpers
//! work equally on a raw store or on a [`crate::storage::NamespacedStorage`].

use tracing::debug;

use crate::Result;
use crate::backend::Storage;
use crate::constants::{AUTH_TOKEN, MANUAL_LOGOUT, SESSION_KEYS, USER_EMAIL, USER_PROFILE};
use crate::profile::UserProfile;

/// Whether the stored keys describe a live session.
///
/// A session is live when both the token and the email are present, or when a
/// profile blob is present. Read failures count as "absent".
pub fn is_authenticated(storage: &dyn Storage) -> bool {
    let present = |key: &str| storage.contains(key).unwrap_or(false);
    (present(AUTH_TOKEN) && present(USER_EMAIL)) || present(USER_PROFILE)
}

/// Records a successful login.
///
/// Writes the token, the profile blob and, when the profile carries one, the
/// raw email. Clears a stale manual-logout marker.
pub fn store_login(storage: &dyn Storage, token: &str, profile: &UserProfile) -> Result<()> {
    storage.set_item(AUTH_TOKEN, token)?;
    if let Some(email) = profile.identifier() {
        storage.set_item(USER_EMAIL, email)?;
    }
    storage.set_item(USER_PROFILE, &profile.to_json()?)?;
    storage.remove_item(MANUAL_LOGOUT)?;
    debug!("Stored login session keys");
    Ok(())
}

/// Removes the session keys.
pub fn clear_session(storage: &dyn Storage) -> Result<()> {
    for key in SESSION_KEYS {
        storage.remove_item(key)?;
    }
    Ok(())
}

/// Performs a user-initiated logout.
///
/// Sets the manual-logout marker and removes the session keys in one step, so
/// the next liveness check classifies the logout as voluntary.
pub fn begin_manual_logout(storage: &dyn Storage) -> Result<()> {
    storage.set_item(MANUAL_LOGOUT, "true")?;
    clear_session(storage)
}

/// Whether the manual-logout marker is set.
pub fn manual_logout_pending(storage: &dyn Storage) -> bool {
    storage.contains(MANUAL_LOGOUT).unwrap_or(false)
}
