//! Constants used throughout the scopekv library.
//!
//! This module is the central key registry: every storage key the application
//! relies on is declared here exactly once, together with the timing defaults
//! used by the session monitor.

use std::time::Duration;

/// Prefix shared by every namespace (`user:<identifier>:`).
pub const NAMESPACE_PREFIX: &str = "user:";

/// Separator terminating the identifier inside a namespace.
pub const NAMESPACE_SEPARATOR: char = ':';

// === System keys (never namespaced) ===

/// Bearer token of the authenticated user.
pub const AUTH_TOKEN: &str = "auth_token";

/// Raw email of the authenticated user.
pub const USER_EMAIL: &str = "user_email";

/// JSON-serialized profile blob of the authenticated user.
pub const USER_PROFILE: &str = "userProfile";

/// Path to return to after a successful login.
pub const REDIRECT_AFTER_LOGIN: &str = "redirectAfterLogin";

/// Email awaiting OTP verification.
pub const PENDING_VERIFICATION_EMAIL: &str = "pendingVerificationEmail";

/// Listing save requested before login, replayed afterwards.
pub const PENDING_SAVE: &str = "pendingSave";

/// UI theme preference.
pub const THEME: &str = "theme";

/// UI locale preference.
pub const LANGUAGE: &str = "language";

/// Cookie consent flag.
pub const COOKIE_CONSENT: &str = "cookieConsent";

/// Marker set right before a user-initiated logout.
pub const MANUAL_LOGOUT: &str = "manual_logout";

/// Keys that always bypass namespacing.
pub const SYSTEM_KEYS: &[&str] = &[
    AUTH_TOKEN,
    USER_EMAIL,
    USER_PROFILE,
    REDIRECT_AFTER_LOGIN,
    PENDING_VERIFICATION_EMAIL,
    PENDING_SAVE,
    THEME,
    LANGUAGE,
    COOKIE_CONSENT,
    MANUAL_LOGOUT,
];

/// Keys whose presence defines an authenticated session.
pub const SESSION_KEYS: &[&str] = &[AUTH_TOKEN, USER_EMAIL, USER_PROFILE];

// === User data keys (always namespaced) ===

/// Keys that always hold per-user data.
pub const USER_DATA_KEYS: &[&str] = &[
    "favorites",
    "savedListings",
    "bookings",
    "cart",
    "wishlist",
    "history",
    "settings",
    "notifications",
];

/// Prefix marking a key as per-user by naming convention.
pub const USER_DATA_KEY_PREFIX: &str = "user";

/// Fragments marking a key as per-user by naming convention.
pub const USER_DATA_FRAGMENTS: &[&str] = &[
    "Saved", "Book", "Fav", "Pref", "Setting", "History", "Recent", "Cart", "Wish",
];

// === Timing defaults ===

/// Interval between liveness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Idle time after which an authenticated session is force-closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Delay between an unauthorized response and its notification.
pub const DEFAULT_AUTH_ERROR_DEBOUNCE: Duration = Duration::from_millis(500);

/// Buffered events per subscriber before the slowest one starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Path fragments of the authentication endpoints.
///
/// Unauthorized responses from these are part of the normal login flow.
pub const AUTH_ENDPOINT_FRAGMENTS: &[&str] = &[
    "/auth/",
    "/login",
    "/register",
    "/verify-otp",
    "/resend-otp",
    "/forgot-password",
    "/reset-password",
];
