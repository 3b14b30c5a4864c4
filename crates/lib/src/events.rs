//! Inbound auth signals and outbound session events.
//!
//! [`AuthSignal`]s are what the rest of the application (and other processes
//! sharing the store) tell the session watcher. [`SessionEvent`]s are what the
//! watcher broadcasts back: login, manual logout, system logout, and forwarded
//! auth errors. Toasts and route guards subscribe through the [`EventBus`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::constants::SESSION_KEYS;

/// Signal that liveness or identity should be re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSignal {
    /// A key changed in another process/tab. `None` means the store was cleared.
    StorageChanged {
        /// The changed key
        key: Option<String>,
    },
    /// Generic "auth state changed".
    AuthChange,
    /// The login flow completed.
    LoginSuccess,
    /// An explicit logout was performed.
    Logout,
    /// A user-initiated logout was performed.
    ManualLogout,
    /// The networking layer received a response.
    HttpResponse {
        /// HTTP status code
        status: u16,
        /// Request path
        path: String,
    },
    /// The networking layer failed without a response.
    NetworkFailure {
        /// Description of the failure
        message: String,
    },
    /// An uncaught application error.
    GlobalFailure {
        /// Description of the failure
        message: String,
    },
    /// The user interacted with the application.
    UserActivity(ActivityKind),
}

impl AuthSignal {
    /// Whether this signal can change who is signed in.
    pub fn affects_identity(&self) -> bool {
        match self {
            AuthSignal::StorageChanged { key: None } => true,
            AuthSignal::StorageChanged { key: Some(key) } => SESSION_KEYS.contains(&key.as_str()),
            AuthSignal::AuthChange
            | AuthSignal::LoginSuccess
            | AuthSignal::Logout
            | AuthSignal::ManualLogout => true,
            AuthSignal::HttpResponse { .. }
            | AuthSignal::NetworkFailure { .. }
            | AuthSignal::GlobalFailure { .. }
            | AuthSignal::UserActivity(_) => false,
        }
    }
}

/// User input that counts as activity for the inactivity timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Pointer pressed
    PointerDown,
    /// Key pressed
    KeyDown,
    /// Page scrolled
    Scroll,
    /// Touch started
    TouchStart,
    /// Click
    Click,
}

/// Why a session was ended without the user asking for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogoutReason {
    /// The inactivity timer fired.
    #[serde(rename = "session expired")]
    SessionExpired,
    /// The session keys disappeared (token rejected or removed elsewhere).
    #[serde(rename = "token_expired")]
    TokenExpired,
}

impl LogoutReason {
    /// Human-readable message shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            LogoutReason::SessionExpired => {
                "You were logged out after a period of inactivity. Please log in again."
            }
            LogoutReason::TokenExpired => "Your session has expired. Please log in again.",
        }
    }
}

/// Payload of a system (involuntary) logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemLogout {
    /// Why the session ended
    pub reason: LogoutReason,
    /// Message for the user
    pub message: String,
    /// RFC3339 time of detection
    pub timestamp: String,
}

/// Kind of an auth error reported by the networking layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// 401 from a non-auth endpoint
    ApiUnauthorized,
    /// 403 from a non-auth endpoint
    ApiForbidden,
    /// Request failed without a response
    NetworkError,
    /// Uncaught application error
    GlobalError,
}

/// Payload of an `auth-error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorNotice {
    /// Kind of error
    #[serde(rename = "type")]
    pub kind: AuthErrorKind,
    /// Message for the user
    pub message: String,
    /// RFC3339 time of detection
    pub timestamp: String,
}

/// Notification broadcast by the session watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A session started.
    Login {
        /// Identifier of the user, if one could be resolved
        identifier: Option<String>,
        /// RFC3339 time of detection
        timestamp: String,
    },
    /// The user logged out on purpose.
    ManualLogout {
        /// RFC3339 time of detection
        timestamp: String,
    },
    /// The session ended without the user asking for it.
    SystemLogout(SystemLogout),
    /// The networking layer reported an auth problem.
    AuthError(AuthErrorNotice),
}

impl SessionEvent {
    /// The event name as the UI knows it.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Login { .. } => "login",
            SessionEvent::ManualLogout { .. } => "manual-logout",
            SessionEvent::SystemLogout(_) => "system-logout",
            SessionEvent::AuthError(_) => "auth-error",
        }
    }
}

/// Process-wide fan-out of [`SessionEvent`]s.
///
/// Cloning the bus yields another handle to the same channel. Emitting with no
/// subscribers is not an error; the event is dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts `event`.
    pub fn emit(&self, event: SessionEvent) {
        trace!(event = event.name(), "Emitting session event");
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EVENT_CAPACITY)
    }
}
