//! Session liveness monitoring
//!
//! There is no push channel from the server, so whether a user is signed in is
//! inferred from the session keys in storage. [`SessionMonitor`] is the
//! synchronous state machine:
//!
//! ```text
//!             keys appear                      keys vanish + marker
//!  LoggedOut ------------> LoggedIn ---------------------------------> LoggedOut (manual-logout)
//!                           |   ^   keys vanish, no marker
//!                           |   |-----------------------------------> LoggedOut (system-logout, token_expired)
//!                           |   idle timeout (keys cleared)
//!                           |-------------------------------------> LoggedOut (system-logout, session expired)
//!                   activity: re-arm idle timer
//! ```
//!
//! [`SessionWatcher`] drives it from a tokio task: a fixed poll interval, the
//! inactivity and debounce deadlines, and a channel of [`AuthSignal`]s.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{clear_session, is_authenticated, manual_logout_pending};
use crate::backend::Storage;
use crate::clock::Clock;
use crate::config::Config;
use crate::constants::MANUAL_LOGOUT;
use crate::events::{
    ActivityKind, AuthErrorKind, AuthErrorNotice, AuthSignal, EventBus, LogoutReason,
    SessionEvent, SystemLogout,
};
use crate::profile::UserProfile;

mod inactivity;
mod interceptor;
mod watcher;

pub use inactivity::InactivityTimer;
pub use interceptor::ResponseInterceptor;
pub use watcher::{SessionWatcher, WatcherHandle};

/// Errors from the session watcher.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A watcher is already running for this runtime.
    #[error("Session watcher already running")]
    AlreadyRunning,

    /// The watcher task has stopped and no longer accepts signals.
    #[error("Session watcher channel closed")]
    ChannelClosed,

    /// No tokio runtime is available to spawn the watcher on.
    #[error("No tokio runtime available for the session watcher")]
    RuntimeUnavailable,

    /// The watcher task panicked or was cancelled.
    #[error("Session watcher task failed: {reason}")]
    TaskFailed {
        /// Join error description
        reason: String,
    },
}

impl From<MonitorError> for crate::Error {
    fn from(err: MonitorError) -> Self {
        crate::Error::Monitor(err)
    }
}

/// Whether a user is signed in, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    /// No session keys present
    LoggedOut,
    /// Session keys present
    LoggedIn,
}

/// A state change detected by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A session started.
    LoggedIn,
    /// The user logged out on purpose.
    ManualLogout,
    /// The session ended without the user asking for it.
    SystemLogout(LogoutReason),
}

#[derive(Debug, Clone)]
struct PendingAuthError {
    notice: AuthErrorNotice,
    due_at: u64,
}

/// Liveness state machine over the session keys.
///
/// Notifications are edge-triggered: repeated polls with unchanged keys emit
/// nothing. Changes that revert within one poll interval are not observed.
pub struct SessionMonitor {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    state: LivenessState,
    inactivity: InactivityTimer,
    interceptor: ResponseInterceptor,
    debounce: Duration,
    pending_error: Option<PendingAuthError>,
}

impl SessionMonitor {
    /// Creates a monitor whose initial state is read from `storage`.
    ///
    /// An existing session is adopted silently (no `Login` event) and its
    /// inactivity timer starts now.
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        config: &Config,
    ) -> Self {
        let mut monitor = Self {
            storage,
            clock,
            events,
            state: LivenessState::LoggedOut,
            inactivity: InactivityTimer::new(config.idle_timeout),
            interceptor: ResponseInterceptor::default(),
            debounce: config.auth_error_debounce,
            pending_error: None,
        };
        if is_authenticated(monitor.storage.as_ref()) {
            monitor.state = LivenessState::LoggedIn;
            monitor.inactivity.arm(monitor.clock.now_millis());
        }
        monitor
    }

    /// Replaces the response interceptor.
    pub fn with_interceptor(mut self, interceptor: ResponseInterceptor) -> Self {
        self.interceptor = interceptor;
        self
    }

    /// Last observed state.
    pub fn state(&self) -> LivenessState {
        self.state
    }

    /// The inactivity timer.
    pub fn inactivity(&self) -> &InactivityTimer {
        &self.inactivity
    }

    /// Re-evaluates the liveness predicate and applies any transition.
    pub fn poll(&mut self) -> Option<Transition> {
        let live = is_authenticated(self.storage.as_ref());
        match (self.state, live) {
            (LivenessState::LoggedOut, true) => {
                self.state = LivenessState::LoggedIn;
                self.inactivity.arm(self.clock.now_millis());
                if let Some(pending) = self.pending_error.take() {
                    // Errors raised before the login completed belong to the login flow.
                    debug!(kind = ?pending.notice.kind, "Dropping auth error superseded by login");
                }
                let identifier = self.identifier();
                info!(identifier = ?identifier, "Session started");
                self.events.emit(SessionEvent::Login {
                    identifier,
                    timestamp: self.clock.now_rfc3339(),
                });
                Some(Transition::LoggedIn)
            }
            (LivenessState::LoggedIn, false) => {
                self.state = LivenessState::LoggedOut;
                self.inactivity.cancel();
                if manual_logout_pending(self.storage.as_ref()) {
                    if let Err(e) = self.storage.remove_item(MANUAL_LOGOUT) {
                        warn!("Failed to clear manual logout marker: {e}");
                    }
                    info!("Session ended by user");
                    self.events.emit(SessionEvent::ManualLogout {
                        timestamp: self.clock.now_rfc3339(),
                    });
                    Some(Transition::ManualLogout)
                } else {
                    Some(self.system_logout(LogoutReason::TokenExpired))
                }
            }
            _ => None,
        }
    }

    /// Records user input, pushing the inactivity deadline back.
    ///
    /// Ignored while logged out.
    pub fn record_activity(&mut self, kind: ActivityKind) {
        if self.state == LivenessState::LoggedIn {
            self.inactivity.arm(self.clock.now_millis());
            debug!(?kind, "Activity recorded");
        }
    }

    /// Closes the session if the inactivity deadline has passed.
    ///
    /// Clears the session keys and emits one `system-logout` with reason
    /// `session expired`.
    pub fn check_inactivity(&mut self) -> Option<Transition> {
        if self.state != LivenessState::LoggedIn
            || !self.inactivity.take_expired(self.clock.now_millis())
        {
            return None;
        }
        if let Err(e) = clear_session(self.storage.as_ref()) {
            warn!("Failed to clear session keys after inactivity: {e}");
        }
        self.state = LivenessState::LoggedOut;
        Some(self.system_logout(LogoutReason::SessionExpired))
    }

    /// Queues an auth error reported by the networking layer.
    ///
    /// Returns true if the signal was an auth error. A newer error replaces a
    /// pending one and restarts the debounce delay.
    pub fn report(&mut self, signal: &AuthSignal) -> bool {
        let Some((kind, message)) = self.interceptor.classify(signal) else {
            return false;
        };
        let now = self.clock.now_millis();
        self.pending_error = Some(PendingAuthError {
            notice: AuthErrorNotice {
                kind,
                message,
                timestamp: self.clock.now_rfc3339(),
            },
            due_at: now.saturating_add(self.debounce.as_millis() as u64),
        });
        debug!(?kind, "Auth error queued");
        true
    }

    /// Broadcasts the pending auth error once its delay has elapsed.
    ///
    /// An unauthorized response while logged in also clears the session keys,
    /// so the next poll reports a `token_expired` logout.
    pub fn flush_due(&mut self) -> Option<AuthErrorNotice> {
        let now = self.clock.now_millis();
        if self.pending_error.as_ref().is_none_or(|p| p.due_at > now) {
            return None;
        }
        let notice = self.pending_error.take()?.notice;
        if notice.kind == AuthErrorKind::ApiUnauthorized && self.state == LivenessState::LoggedIn
        {
            if let Err(e) = clear_session(self.storage.as_ref()) {
                warn!("Failed to clear session keys after unauthorized response: {e}");
            }
        }
        warn!(kind = ?notice.kind, "{}", notice.message);
        self.events.emit(SessionEvent::AuthError(notice.clone()));
        Some(notice)
    }

    /// Applies an inbound signal.
    pub fn handle_signal(&mut self, signal: &AuthSignal) -> Option<Transition> {
        match signal {
            AuthSignal::UserActivity(kind) => {
                self.record_activity(*kind);
                None
            }
            AuthSignal::HttpResponse { .. }
            | AuthSignal::NetworkFailure { .. }
            | AuthSignal::GlobalFailure { .. } => {
                self.report(signal);
                None
            }
            AuthSignal::StorageChanged { .. }
            | AuthSignal::AuthChange
            | AuthSignal::LoginSuccess
            | AuthSignal::Logout
            | AuthSignal::ManualLogout => self.poll(),
        }
    }

    /// Runs every time-driven check: debounce, inactivity, then liveness.
    pub fn tick(&mut self) -> Vec<Transition> {
        self.flush_due();
        self.check_inactivity()
            .into_iter()
            .chain(self.poll())
            .collect()
    }

    /// Earliest instant (ms since epoch) at which [`SessionMonitor::tick`] has work.
    pub fn next_deadline(&self) -> Option<u64> {
        let pending = self.pending_error.as_ref().map(|p| p.due_at);
        match (self.inactivity.deadline(), pending) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn system_logout(&mut self, reason: LogoutReason) -> Transition {
        info!(?reason, "Session ended by system");
        self.events.emit(SessionEvent::SystemLogout(SystemLogout {
            reason,
            message: reason.message().to_string(),
            timestamp: self.clock.now_rfc3339(),
        }));
        Transition::SystemLogout(reason)
    }

    fn identifier(&self) -> Option<String> {
        let from_profile = self
            .storage
            .get_item(crate::constants::USER_PROFILE)
            .ok()
            .flatten()
            .and_then(|raw| UserProfile::parse(&raw))
            .and_then(|p| p.identifier().map(str::to_string));
        from_profile.or_else(|| {
            self.storage
                .get_item(crate::constants::USER_EMAIL)
                .ok()
                .flatten()
        })
    }
}
