//! The profile blob stored under [`crate::constants::USER_PROFILE`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::Result;

/// Profile of the authenticated user as written by the login flow.
///
/// Only the email and the verification flag are interpreted here; every other
/// field the API returns is preserved untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable identifier of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the email address has passed OTP verification.
    #[serde(default)]
    pub is_verified: bool,

    /// Remaining fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Creates a profile with the given email.
    pub fn new(email: impl Into<String>, is_verified: bool) -> Self {
        Self {
            email: Some(email.into()),
            is_verified,
            extra: Map::new(),
        }
    }

    /// Parses a stored profile blob.
    ///
    /// Malformed JSON is logged and treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Ignoring malformed profile blob: {e}");
                None
            }
        }
    }

    /// The identifier namespaces are derived from, if usable.
    pub fn identifier(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Serializes the profile for storage.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
