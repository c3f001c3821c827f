//! # Connectivity Bus - Event Bus for Terminal Connectivity Signals
//!
//! Carries every connectivity signal a voting terminal reacts to through one
//! subscription point, so no component is wired to a specific runtime's
//! event system.
//!
//! ```text
//! ┌──────────────┐  Online/Offline   ┌──────────────┐
//! │   Runtime    │ ────────┐         │  Submission  │
//! └──────────────┘         │         │   Machine    │
//! ┌──────────────┐         ▼         └──────────────┘
//! │   Watchdog   │   ┌──────────────┐        ↑
//! │              │──▶│ Connectivity │────────┘
//! └──────────────┘   │     Bus      │  subscribe()
//!   HealthChanged    └──────────────┘
//! ```
//!
//! Native platform signals (`online`/`offline`) and the watchdog's own health
//! transitions share the same [`ConnectivityEvent`] vocabulary.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ConnectivityEvent, EventFilter, EventTopic, NetworkHealth};
pub use publisher::{BusStats, InMemoryConnectivityBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 64);
    }
}
