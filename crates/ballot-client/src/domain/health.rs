//! # Health Tracker
//!
//! Pure hysteresis logic behind the network watchdog. Time is passed in so
//! the transitions are deterministic.

use connectivity_bus::NetworkHealth;

use super::invariants::invariant_outage_elapsed;
use super::value_objects::Timestamp;

/// A change of health classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthTransition {
    /// Previous state.
    pub from: NetworkHealth,
    /// New state.
    pub to: NetworkHealth,
}

impl HealthTransition {
    /// True when this transition enters `down`.
    pub fn entered_down(&self) -> bool {
        self.to == NetworkHealth::Down && self.from != NetworkHealth::Down
    }
}

/// Point-in-time view of the watchdog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthSnapshot {
    /// Current classification.
    pub state: NetworkHealth,
    /// Last successful probe (or session start).
    pub last_healthy: Timestamp,
    /// Failed probes since the last success.
    pub consecutive_failures: u32,
}

/// Connectivity classifier with outage hysteresis.
#[derive(Clone, Debug)]
pub struct HealthTracker {
    state: NetworkHealth,
    last_healthy: Timestamp,
    consecutive_failures: u32,
    outage_threshold_ms: u64,
}

impl HealthTracker {
    /// Start `healthy`, with "last healthy" at `now`.
    pub fn new(now: Timestamp, outage_threshold_ms: u64) -> Self {
        Self {
            state: NetworkHealth::Healthy,
            last_healthy: now,
            consecutive_failures: 0,
            outage_threshold_ms,
        }
    }

    /// Current classification.
    pub fn state(&self) -> NetworkHealth {
        self.state
    }

    /// Apply one probe result.
    ///
    /// Success: `healthy`, last-healthy reset. Failure: `degraded`, or `down`
    /// once the threshold has elapsed since the last success.
    pub fn record_probe(&mut self, reachable: bool, now: Timestamp) -> Option<HealthTransition> {
        let next = if reachable {
            self.last_healthy = now;
            self.consecutive_failures = 0;
            NetworkHealth::Healthy
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            if invariant_outage_elapsed(self.last_healthy, now, self.outage_threshold_ms) {
                NetworkHealth::Down
            } else {
                NetworkHealth::Degraded
            }
        };
        self.transition_to(next)
    }

    /// Platform reported offline: `down` immediately, last-healthy untouched.
    pub fn force_down(&mut self) -> Option<HealthTransition> {
        self.transition_to(NetworkHealth::Down)
    }

    /// Snapshot for status displays.
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            state: self.state,
            last_healthy: self.last_healthy,
            consecutive_failures: self.consecutive_failures,
        }
    }

    fn transition_to(&mut self, next: NetworkHealth) -> Option<HealthTransition> {
        if next == self.state {
            return None;
        }
        let transition = HealthTransition {
            from: self.state,
            to: next,
        };
        self.state = next;
        Some(transition)
    }
}
