//! Bootstrap of the namespacing layer and the session watcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::info;

use crate::Result;
use crate::backend::Storage;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::events::{EventBus, SessionEvent};
use crate::monitor::{MonitorError, SessionMonitor, SessionWatcher, WatcherHandle};
use crate::namespace::SessionContext;
use crate::storage::NamespacedStorage;

/// Everything an application needs, built once at startup.
///
/// Opening the runtime installs the namespaced storage (running the initial
/// purge and migration). The rest of the application should only be handed
/// [`SessionRuntime::storage`]. At most one watcher runs per runtime.
pub struct SessionRuntime {
    raw: Arc<dyn Storage>,
    storage: Arc<NamespacedStorage>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    config: Config,
    watching: Arc<AtomicBool>,
}

impl SessionRuntime {
    /// Opens a runtime over `raw` using the system clock.
    pub fn open(raw: Arc<dyn Storage>, config: Config) -> Result<Self> {
        Self::open_with_clock(raw, config, Arc::new(SystemClock))
    }

    /// Opens a runtime over `raw` with an explicit clock.
    pub fn open_with_clock(
        raw: Arc<dyn Storage>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let context = Arc::new(SessionContext::new());
        let storage = Arc::new(NamespacedStorage::new(raw.clone(), context));
        let events = EventBus::new(config.event_capacity);
        info!(
            namespace = ?storage.namespace().as_ref().map(|ns| ns.as_str()),
            "Session runtime opened"
        );
        Ok(Self {
            raw,
            storage,
            events,
            clock,
            config,
            watching: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The namespaced store, as the plain storage interface.
    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// The namespaced store with its extensions.
    pub fn namespaced(&self) -> &Arc<NamespacedStorage> {
        &self.storage
    }

    /// The raw store underneath the namespacing layer.
    pub fn raw(&self) -> &Arc<dyn Storage> {
        &self.raw
    }

    /// The bus session events are broadcast on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The validated configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clock shared by the monitor and the watcher.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Builds a monitor over the raw store, sharing this runtime's bus and clock.
    ///
    /// Useful for driving the state machine by hand; [`SessionRuntime::start_watcher`]
    /// builds its own.
    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor::new(
            self.raw.clone(),
            self.clock.clone(),
            self.events.clone(),
            &self.config,
        )
    }

    /// Whether a watcher started from this runtime is still alive.
    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    /// Spawns the session watcher on the current tokio runtime.
    ///
    /// Fails with [`MonitorError::AlreadyRunning`] while a previous handle is
    /// alive.
    pub fn start_watcher(&self) -> Result<WatcherHandle> {
        if self
            .watching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MonitorError::AlreadyRunning.into());
        }

        let started = SessionWatcher::start(
            self.monitor(),
            self.storage.manager().clone(),
            self.clock.clone(),
            self.config.poll_interval,
        );
        match started {
            Ok(handle) => Ok(handle.with_running_flag(self.watching.clone())),
            Err(e) => {
                self.watching.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}
