//! Single-slot inactivity deadline.

use std::time::Duration;

/// Deadline after which an idle session is closed.
///
/// There is at most one outstanding deadline: arming replaces it, and
/// [`InactivityTimer::take_expired`] disarms it, so each arming fires at most
/// once.
#[derive(Debug, Clone)]
pub struct InactivityTimer {
    timeout: Duration,
    deadline: Option<u64>,
}

impl InactivityTimer {
    /// Creates a disarmed timer.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Starts or restarts the countdown from `now_millis`.
    pub fn arm(&mut self, now_millis: u64) {
        self.deadline = Some(now_millis.saturating_add(self.timeout.as_millis() as u64));
    }

    /// Cancels the countdown.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Deadline in milliseconds since the epoch, if armed.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Whether a countdown is running.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarms and returns true if the deadline has passed.
    pub fn take_expired(&mut self, now_millis: u64) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now_millis => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
