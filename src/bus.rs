//! The action bus: a totally ordered stream of actions that owns the
//! dashboard state.
//!
//! [`Bus::publish`] folds the action into the state and then fans it out to
//! every subscriber of its kind, all under one lock. Fold order therefore
//! equals publish order, and every subscriber sees its actions in that same
//! order. Subscriptions are unbounded queues: an action published while a
//! listener is busy waits in its queue until the listener asks for it.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};

use crate::action::{Action, ActionKind};
use crate::reducer::fold;
use crate::state::DashboardState;

/// Cloneable handle to the action bus and the state it owns.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

struct BusInner {
    /// Current state; the bus is its only writer.
    state: watch::Sender<Arc<DashboardState>>,
    /// Held for the whole fold-then-fan-out of one action.
    subscribers: Mutex<Vec<Subscriber>>,
}

struct Subscriber {
    kind: ActionKind,
    tx: mpsc::UnboundedSender<Action>,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("subscribers", &self.lock_subscribers().len())
            .finish()
    }
}

impl Bus {
    /// Create a bus whose state starts at `initial`.
    pub fn new(initial: DashboardState) -> Self {
        let (state, _) = watch::channel(Arc::new(initial));
        Self {
            inner: Arc::new(BusInner {
                state,
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Publish an action: fold it into the state, then deliver it to every
    /// subscriber of its kind.
    ///
    /// Never blocks and never fails. Subscribers whose receiving end has been
    /// dropped are pruned.
    pub fn publish(&self, action: Action) {
        let kind = action.kind();
        let mut subscribers = self.lock_subscribers();

        let changed = self.inner.state.send_if_modified(|current| {
            let next = fold(current, &action);
            if Arc::ptr_eq(current, &next) {
                false
            } else {
                *current = next;
                true
            }
        });
        tracing::debug!(
            label = kind.label(),
            command = kind.is_command(),
            changed,
            "action published"
        );

        subscribers.retain(|s| !s.tx.is_closed());
        for subscriber in subscribers.iter().filter(|s| s.kind == kind) {
            // The receiver may close between `retain` and here; the action is
            // simply dropped for it.
            let _ = subscriber.tx.send(action.clone());
        }
    }

    /// Subscribe to every future action of `kind`.
    ///
    /// Actions published before this call are not delivered.
    pub fn subscribe(&self, kind: ActionKind) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_subscribers().push(Subscriber { kind, tx });
        Subscription { kind, rx }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Arc<DashboardState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// A receiver notified each time a folded action changes the state.
    pub fn watch_state(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.inner.state.subscribe()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        // Fan-out cannot panic halfway through a push, so the list is intact
        // even if a holder panicked.
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiving end of a [`Bus::subscribe`] call.
#[derive(Debug)]
pub struct Subscription {
    kind: ActionKind,
    rx: mpsc::UnboundedReceiver<Action>,
}

impl Subscription {
    /// Wait for the next action of this subscription's kind.
    ///
    /// Returns `None` once every [`Bus`] handle has been dropped and the
    /// queue is drained.
    pub async fn next(&mut self) -> Option<Action> {
        self.rx.recv().await
    }

    /// Take the next queued action without waiting.
    pub fn try_next(&mut self) -> Option<Action> {
        self.rx.try_recv().ok()
    }

    /// The kind this subscription was created for.
    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WeatherRecord;
    use serde_json::json;

    #[test]
    fn publish_folds_into_state() {
        let bus = Bus::new(DashboardState::default());
        bus.publish(Action::select_marker("ship", json!({"id": 1})));
        assert_eq!(bus.state().info_box.kind, "ship");
    }

    #[test]
    fn command_publish_keeps_state_reference() {
        let bus = Bus::new(DashboardState::default());
        let before = bus.state();
        bus.publish(Action::simulate_storm());
        assert!(Arc::ptr_eq(&before, &bus.state()));
    }

    #[test]
    fn subscribers_only_receive_their_kind() {
        let bus = Bus::new(DashboardState::default());
        let mut storms = bus.subscribe(ActionKind::SimulateStorm);
        let mut admin = bus.subscribe(ActionKind::GetAdminData);

        bus.publish(Action::simulate_storm());
        bus.publish(Action::get_admin_data("g1"));
        bus.publish(Action::simulate_storm());

        assert_eq!(storms.try_next(), Some(Action::SimulateStorm));
        assert_eq!(storms.try_next(), Some(Action::SimulateStorm));
        assert_eq!(storms.try_next(), None);
        assert_eq!(admin.try_next(), Some(Action::get_admin_data("g1")));
        assert_eq!(admin.try_next(), None);
        assert_eq!(storms.kind(), ActionKind::SimulateStorm);
    }

    #[test]
    fn actions_before_subscribe_are_not_delivered() {
        let bus = Bus::new(DashboardState::default());
        bus.publish(Action::simulate_storm());
        let mut storms = bus.subscribe(ActionKind::SimulateStorm);
        assert_eq!(storms.try_next(), None);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let bus = Bus::new(DashboardState::default());
        let storms = bus.subscribe(ActionKind::SimulateStorm);
        drop(storms);
        bus.publish(Action::simulate_storm());
        assert_eq!(bus.lock_subscribers().len(), 0);
    }

    #[tokio::test]
    async fn watch_sees_only_changing_actions() {
        let bus = Bus::new(DashboardState::default());
        let mut rx = bus.watch_state();

        bus.publish(Action::get_admin_data("g1"));
        assert!(!rx.has_changed().unwrap());

        let record: WeatherRecord = serde_json::from_value(json!({"id": "storm1"})).unwrap();
        bus.publish(Action::storm_received(record));
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.weather[0].fields["id"], "storm1");
    }

    #[tokio::test]
    async fn next_returns_none_after_bus_dropped() {
        let bus = Bus::new(DashboardState::default());
        let mut storms = bus.subscribe(ActionKind::SimulateStorm);
        bus.publish(Action::simulate_storm());
        drop(bus);

        assert_eq!(storms.next().await, Some(Action::SimulateStorm));
        assert_eq!(storms.next().await, None);
    }
}
