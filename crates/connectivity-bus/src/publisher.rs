//! # Connectivity Bus
//!
//! Broadcast hub for platform signals and watchdog transitions. Emitting
//! never blocks and never fails: a signal nobody listens to is simply lost.

use crate::events::{ConnectivityEvent, EventFilter, NetworkHealth};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Per-kind emission counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    /// `Online` signals.
    pub online: u64,
    /// `Offline` signals.
    pub offline: u64,
    /// Watchdog transitions.
    pub health_changes: u64,
    /// Events emitted while nobody was subscribed.
    pub unheard: u64,
}

#[derive(Default)]
struct BusState {
    stats: BusStats,
    last_health: Option<NetworkHealth>,
}

/// In-process connectivity bus over `tokio::sync::broadcast`.
///
/// Every subscriber sees every event; topic filtering happens on receive.
pub struct InMemoryConnectivityBus {
    sender: broadcast::Sender<ConnectivityEvent>,
    state: Mutex<BusState>,
}

impl InMemoryConnectivityBus {
    /// Bus with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering up to `capacity` events per lagging subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            state: Mutex::new(BusState::default()),
        }
    }

    /// Broadcast an event, returning how many receivers it reached. Safe to
    /// call from synchronous code.
    pub fn emit(&self, event: ConnectivityEvent) -> usize {
        let name = event.name();
        let receivers = self.sender.send(event.clone()).unwrap_or(0);

        let mut state = self.state.lock();
        match event {
            ConnectivityEvent::Online => state.stats.online += 1,
            ConnectivityEvent::Offline => state.stats.offline += 1,
            ConnectivityEvent::HealthChanged { to, .. } => {
                state.stats.health_changes += 1;
                state.last_health = Some(to);
            }
        }
        if receivers == 0 {
            state.stats.unheard += 1;
            trace!(event = name, "[bt] connectivity event unheard");
        } else {
            debug!(event = name, receivers, "[bt] connectivity event emitted");
        }
        receivers
    }

    /// Subscribe to events accepted by `filter`.
    ///
    /// Only events emitted after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "[bt] connectivity subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Most recent health carried by a `HealthChanged` event, if any.
    #[must_use]
    pub fn last_health(&self) -> Option<NetworkHealth> {
        self.state.lock().last_health
    }

    /// Counters since creation.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.state.lock().stats
    }

    /// Live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryConnectivityBus {
    fn default() -> Self {
        Self::new()
    }
}
