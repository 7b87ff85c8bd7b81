//! Top-level entry point that wires the bus, the state, and the three
//! command listeners into a single [`Dashboard`] handle.
//!
//! The dashboard is started once via [`DashboardBuilder::start`]. Its
//! listeners live for as long as the tokio runtime does; there is no
//! shutdown path.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::action::Action;
use crate::api::RemoteApi;
use crate::bus::Bus;
use crate::listener::{
    AcknowledgeListener, AdminDataListener, CommandListener, ListenerFailure, StormListener,
    run_listener,
};
use crate::session::SessionProvider;
use crate::state::DashboardState;

/// Default capacity of the diagnostic failure channel.
const DEFAULT_FAILURE_BUFFER: usize = 64;

/// Configuration applied when the dashboard starts.
///
/// # Examples
///
/// ```
/// use dashfold::{DashboardConfig, DashboardState};
///
/// let config = DashboardConfig {
///     failure_buffer: 16,
///     ..DashboardConfig::default()
/// };
/// assert_eq!(config.initial_state, DashboardState::default());
/// assert!(config.initial_state.info_box.is_hidden());
/// ```
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// State the bus starts from.
    ///
    /// Default: hidden info box, all collections empty.
    pub initial_state: DashboardState,

    /// How many listener failures the diagnostic channel buffers for slow
    /// readers before they start missing reports.
    ///
    /// Default: 64. Values below 1 are raised to 1.
    pub failure_buffer: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            initial_state: DashboardState::default(),
            failure_buffer: DEFAULT_FAILURE_BUFFER,
        }
    }
}

/// Builder for [`Dashboard`].
pub struct DashboardBuilder {
    api: Arc<dyn RemoteApi>,
    session: Arc<dyn SessionProvider>,
    config: DashboardConfig,
}

impl DashboardBuilder {
    /// Create a builder for a dashboard backed by `api`, authenticating
    /// with tokens read from `session`.
    pub fn new(api: Arc<dyn RemoteApi>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            api,
            session,
            config: DashboardConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the state the dashboard starts from.
    pub fn initial_state(mut self, state: DashboardState) -> Self {
        self.config.initial_state = state;
        self
    }

    /// Set the capacity of the diagnostic failure channel.
    pub fn failure_buffer(mut self, capacity: usize) -> Self {
        self.config.failure_buffer = capacity;
        self
    }

    /// Create the bus and spawn the three command listeners.
    ///
    /// Every listener subscribes before this returns, so commands
    /// dispatched right after `start` are queued, not lost.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(self) -> Dashboard {
        let bus = Bus::new(self.config.initial_state);
        let (failures, _) = broadcast::channel(self.config.failure_buffer.max(1));

        let tasks = vec![
            spawn(
                AdminDataListener::new(Arc::clone(&self.api)),
                &bus,
                &self.session,
                &failures,
            ),
            spawn(
                StormListener::new(Arc::clone(&self.api)),
                &bus,
                &self.session,
                &failures,
            ),
            spawn(
                AcknowledgeListener::new(Arc::clone(&self.api)),
                &bus,
                &self.session,
                &failures,
            ),
        ];
        tracing::info!(listeners = tasks.len(), "dashboard started");

        Dashboard {
            bus,
            failures,
            tasks: Arc::new(tasks),
        }
    }
}

fn spawn<L: CommandListener>(
    listener: L,
    bus: &Bus,
    session: &Arc<dyn SessionProvider>,
    failures: &broadcast::Sender<ListenerFailure>,
) -> (&'static str, JoinHandle<()>) {
    let subscription = bus.subscribe(L::KIND);
    let handle = tokio::spawn(run_listener(
        listener,
        subscription,
        bus.clone(),
        Arc::clone(session),
        failures.clone(),
    ));
    (L::NAME, handle)
}

/// Handle to a running dashboard core.
///
/// `Clone` is cheap; all clones share one bus, one state, and one set of
/// listeners.
#[derive(Clone)]
pub struct Dashboard {
    bus: Bus,
    failures: broadcast::Sender<ListenerFailure>,
    tasks: Arc<Vec<(&'static str, JoinHandle<()>)>>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("bus", &self.bus)
            .field("listeners", &self.tasks.iter().map(|(n, _)| *n).collect::<Vec<_>>())
            .finish()
    }
}

impl Dashboard {
    /// Shorthand for [`DashboardBuilder::new`].
    pub fn builder(api: Arc<dyn RemoteApi>, session: Arc<dyn SessionProvider>) -> DashboardBuilder {
        DashboardBuilder::new(api, session)
    }

    /// Publish an action onto the bus.
    pub fn dispatch(&self, action: Action) {
        self.bus.publish(action);
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<DashboardState> {
        self.bus.state()
    }

    /// Receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.bus.watch_state()
    }

    /// Subscribe to listener failures.
    ///
    /// Reports are diagnostic only: they are sent after the failure has
    /// already been logged and swallowed, and a lagging receiver misses the
    /// oldest ones.
    pub fn failures(&self) -> broadcast::Receiver<ListenerFailure> {
        self.failures.subscribe()
    }

    /// The underlying bus, for publishers and extra subscribers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Names of the listeners whose task is still running.
    pub fn running_listeners(&self) -> Vec<&'static str> {
        self.tasks
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(name, _)| *name)
            .collect()
    }
}
