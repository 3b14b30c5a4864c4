//! Background task driving the session monitor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{Instrument, debug, info, info_span};

use super::{MonitorError, SessionMonitor, Transition};
use crate::Result;
use crate::clock::Clock;
use crate::events::AuthSignal;
use crate::namespace::NamespaceManager;

/// Commands accepted by the watcher task.
#[derive(Debug)]
enum WatcherCommand {
    Signal(AuthSignal),
    Shutdown,
}

/// Owns the monitor and the namespace manager inside a tokio task.
///
/// Three sources wake the task: the poll interval, the monitor's next deadline
/// (inactivity or debounce), and inbound signals. Every liveness transition
/// and every identity signal is followed by a namespace refresh, so purge and
/// migration finish before the next command is handled. Ticks without a
/// transition still compare the stored identity with the active namespace, so
/// a user switch by another writer is picked up within one poll interval.
pub struct SessionWatcher {
    monitor: SessionMonitor,
    manager: NamespaceManager,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    commands: mpsc::Receiver<WatcherCommand>,
}

impl SessionWatcher {
    /// Spawns the watcher on the current tokio runtime.
    pub fn start(
        monitor: SessionMonitor,
        manager: NamespaceManager,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Result<WatcherHandle> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| MonitorError::RuntimeUnavailable)?;
        let (tx, rx) = mpsc::channel(100);

        let watcher = Self {
            monitor,
            manager,
            clock,
            poll_interval,
            commands: rx,
        };
        let task = runtime.spawn(watcher.run());

        Ok(WatcherHandle {
            commands: tx,
            task: Some(task),
            running: None,
        })
    }

    async fn run(mut self) {
        async move {
            info!("Starting session watcher");
            let mut poll = interval(self.poll_interval);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let wake_in = self
                    .monitor
                    .next_deadline()
                    .map(|deadline| deadline.saturating_sub(self.clock.now_millis()));
                let deadline = async move {
                    match wake_in {
                        Some(ms) => sleep(Duration::from_millis(ms)).await,
                        None => std::future::pending::<()>().await,
                    }
                };

                tokio::select! {
                    cmd = self.commands.recv() => match cmd {
                        Some(WatcherCommand::Signal(signal)) => self.handle_signal(signal),
                        Some(WatcherCommand::Shutdown) | None => break,
                    },

                    _ = poll.tick() => self.tick(),

                    _ = deadline => self.tick(),
                }
            }
            info!("Session watcher stopped");
        }
        .instrument(info_span!("session_watcher"))
        .await
    }

    fn tick(&mut self) {
        let transitions = self.monitor.tick();
        if !transitions.is_empty() {
            self.after_transitions(&transitions);
        } else if let Some(refresh) = self.manager.refresh_if_stale() {
            info!(
                namespace = ?refresh.namespace.as_ref().map(|ns| ns.as_str()),
                purged = refresh.purged,
                migrated = refresh.migrated,
                "Signed-in user changed"
            );
        }
    }

    fn handle_signal(&mut self, signal: AuthSignal) {
        debug!(?signal, "Received auth signal");
        let transition = self.monitor.handle_signal(&signal);
        if let Some(transition) = transition {
            self.after_transitions(&[transition]);
        } else if signal.affects_identity() {
            self.manager.refresh();
        }
    }

    fn after_transitions(&self, transitions: &[Transition]) {
        let refresh = self.manager.refresh();
        debug!(
            ?transitions,
            namespace = ?refresh.namespace.as_ref().map(|ns| ns.as_str()),
            purged = refresh.purged,
            migrated = refresh.migrated,
            "Namespace refreshed after liveness change"
        );
    }
}

/// Handle to a running [`SessionWatcher`].
///
/// Dropping the handle aborts the task; [`WatcherHandle::shutdown`] stops it
/// gracefully and waits for it.
pub struct WatcherHandle {
    commands: mpsc::Sender<WatcherCommand>,
    task: Option<JoinHandle<()>>,
    running: Option<Arc<AtomicBool>>,
}

impl WatcherHandle {
    /// Ties the handle to a "watcher running" flag, cleared when it stops.
    pub(crate) fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    /// Delivers a signal to the watcher.
    pub async fn signal(&self, signal: AuthSignal) -> Result<()> {
        self.commands
            .send(WatcherCommand::Signal(signal))
            .await
            .map_err(|_| MonitorError::ChannelClosed.into())
    }

    /// Delivers a signal without waiting for channel capacity.
    pub fn try_signal(&self, signal: AuthSignal) -> Result<()> {
        self.commands
            .try_send(WatcherCommand::Signal(signal))
            .map_err(|_| MonitorError::ChannelClosed.into())
    }

    /// Whether the watcher task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the watcher and waits for it to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.commands.send(WatcherCommand::Shutdown).await;
        let result: Result<()> = match self.task.take() {
            Some(task) => task.await.map_err(|e| {
                MonitorError::TaskFailed {
                    reason: e.to_string(),
                }
                .into()
            }),
            None => Ok(()),
        };
        self.release();
        result
    }

    fn release(&mut self) {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.release();
    }
}
