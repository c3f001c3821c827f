//! # Network Watchdog
//!
//! Polls the liveness endpoint on a fixed interval, classifies connectivity
//! through `HealthTracker`, and fans each transition out to the bus, the
//! view, metrics and (when entering `down`) the incident reporter.
//!
//! Platform signals arrive on the bus: `Offline` forces `down` and reports an
//! `offline` incident; `Online` triggers an out-of-cycle probe.

use connectivity_bus::{ConnectivityEvent, InMemoryConnectivityBus, NetworkHealth, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use terminal_telemetry::{metric_set, NETWORK_HEALTH_STATE, PROBE_RESULTS};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::application::reporter::IncidentReporter;
use crate::domain::{HealthSnapshot, HealthTracker, HealthTransition, IncidentKind};
use crate::ports::{HealthProbe, TerminalView, TimeSource};

/// Periodic connectivity classifier.
pub struct NetworkWatchdog {
    probe: Arc<dyn HealthProbe>,
    clock: Arc<dyn TimeSource>,
    bus: Arc<InMemoryConnectivityBus>,
    reporter: Arc<IncidentReporter>,
    view: Arc<dyn TerminalView>,
    tracker: Mutex<HealthTracker>,
    interval: Duration,
}

impl NetworkWatchdog {
    /// Create a watchdog; "last healthy" starts at the clock's current time.
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        clock: Arc<dyn TimeSource>,
        bus: Arc<InMemoryConnectivityBus>,
        reporter: Arc<IncidentReporter>,
        view: Arc<dyn TerminalView>,
        interval: Duration,
        outage_threshold_ms: u64,
    ) -> Self {
        let tracker = HealthTracker::new(clock.now(), outage_threshold_ms);
        Self {
            probe,
            clock,
            bus,
            reporter,
            view,
            tracker: Mutex::new(tracker),
            interval,
        }
    }

    /// Current classification.
    pub fn state(&self) -> NetworkHealth {
        self.tracker.lock().state()
    }

    /// Current classification with timing detail.
    pub fn snapshot(&self) -> HealthSnapshot {
        self.tracker.lock().snapshot()
    }

    /// Probe once and apply the result.
    pub async fn probe_now(&self) -> NetworkHealth {
        let reachable = self.probe.probe().await;
        self.record_probe(reachable)
    }

    /// Start a probe on its own task so the caller keeps handling events.
    fn spawn_probe(&self) -> JoinHandle<bool> {
        let probe = Arc::clone(&self.probe);
        tokio::spawn(async move { probe.probe().await })
    }

    fn record_probe(&self, reachable: bool) -> NetworkHealth {
        PROBE_RESULTS
            .with_label_values(&[if reachable { "reachable" } else { "unreachable" }])
            .inc();

        let now = self.clock.now();
        let (transition, snapshot) = {
            let mut tracker = self.tracker.lock();
            (tracker.record_probe(reachable, now), tracker.snapshot())
        };

        if let Some(transition) = transition {
            self.apply(transition);
            if transition.entered_down() {
                let detail = format!(
                    "no successful probe for {} ms ({} consecutive failures)",
                    now.millis_since(snapshot.last_healthy),
                    snapshot.consecutive_failures
                );
                self.reporter.report(IncidentKind::NetworkOutage, &detail);
            }
        }
        snapshot.state
    }

    /// Platform reported loss of connectivity.
    pub fn on_offline(&self) -> Option<HealthTransition> {
        let transition = self.tracker.lock().force_down();
        if let Some(transition) = transition {
            self.apply(transition);
        }
        self.reporter
            .report(IncidentKind::Offline, "platform reported offline");
        transition
    }

    fn apply(&self, transition: HealthTransition) {
        let HealthTransition { from, to } = transition;
        match to {
            NetworkHealth::Healthy => tracing::info!(%from, %to, "[bt] 🟢 network healthy"),
            NetworkHealth::Degraded => tracing::warn!(%from, %to, "[bt] 🟡 network degraded"),
            NetworkHealth::Down => tracing::warn!(%from, %to, "[bt] 🔴 network down"),
        }
        metric_set!(NETWORK_HEALTH_STATE, to.gauge_value());
        self.view.render_health(to);
        self.bus.emit(ConnectivityEvent::HealthChanged { from, to });
    }

    /// Probe loop. The first probe fires one interval after start.
    ///
    /// `events` should carry platform events. They are handled while a probe
    /// is in flight; `Offline` drops that probe so its stale answer cannot
    /// undo the forced `down`. Returns when `shutdown` flips to `true` or its
    /// sender is dropped.
    pub async fn run(self: Arc<Self>, mut events: Subscription, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<JoinHandle<bool>> = None;
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "[bt] watchdog started");

        loop {
            tokio::select! {
                _ = ticker.tick(), if in_flight.is_none() => {
                    in_flight = Some(self.spawn_probe());
                }
                joined = probe_result(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match joined {
                        Ok(reachable) => {
                            self.record_probe(reachable);
                        }
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => tracing::warn!(error = %e, "[bt] probe task failed"),
                    }
                }
                event = events.recv() => match event {
                    Some(ConnectivityEvent::Offline) => {
                        if let Some(stale) = in_flight.take() {
                            stale.abort();
                        }
                        self.on_offline();
                    }
                    Some(ConnectivityEvent::Online) => {
                        if in_flight.is_none() {
                            in_flight = Some(self.spawn_probe());
                        }
                        ticker.reset();
                    }
                    Some(ConnectivityEvent::HealthChanged { .. }) => {}
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        if let Some(probe) = in_flight {
            probe.abort();
        }
        tracing::debug!("[bt] watchdog stopped");
    }
}

async fn probe_result(slot: &mut Option<JoinHandle<bool>>) -> Result<bool, JoinError> {
    match slot {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
