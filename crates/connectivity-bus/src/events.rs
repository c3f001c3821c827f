//! # Connectivity Events
//!
//! Defines all event types that flow through the connectivity bus.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-valued connectivity classification produced by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkHealth {
    /// Latest probe succeeded.
    Healthy,
    /// Latest probe failed, outage threshold not yet reached.
    Degraded,
    /// Continuous failure past the outage threshold, or platform reported offline.
    Down,
}

impl NetworkHealth {
    /// Stable lowercase name, used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        }
    }

    /// Numeric gauge value (0 = healthy, 1 = degraded, 2 = down).
    #[must_use]
    pub fn gauge_value(&self) -> f64 {
        match self {
            Self::Healthy => 0.0,
            Self::Degraded => 1.0,
            Self::Down => 2.0,
        }
    }
}

impl fmt::Display for NetworkHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All events that can be published to the connectivity bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityEvent {
    // =========================================================================
    // PLATFORM SIGNALS (advisory)
    // =========================================================================
    /// The platform reports that the network came back.
    Online,

    /// The platform reports that the network is gone.
    Offline,

    // =========================================================================
    // WATCHDOG
    // =========================================================================
    /// The watchdog changed its health classification.
    HealthChanged {
        /// State before the transition.
        from: NetworkHealth,
        /// State after the transition.
        to: NetworkHealth,
    },
}

impl ConnectivityEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Online | Self::Offline => EventTopic::Platform,
            Self::HealthChanged { .. } => EventTopic::Watchdog,
        }
    }

    /// True when this event signals that connectivity has been restored.
    ///
    /// A watchdog transition only counts when it leaves `Down`; a
    /// `Degraded -> Healthy` blip is not a reconnect.
    #[must_use]
    pub fn is_reconnect(&self) -> bool {
        match self {
            Self::Online => true,
            Self::HealthChanged { from, to } => {
                *from == NetworkHealth::Down && *to == NetworkHealth::Healthy
            }
            Self::Offline => false,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Native online/offline signals.
    Platform,
    /// Watchdog health transitions.
    Watchdog,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ConnectivityEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
