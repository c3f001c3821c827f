//! # Outbound Ports
//!
//! Dependencies of the ballot client: the vote/health/incident endpoints,
//! durable key-value storage, the clock and the terminal view.
//!
//! Production: `HttpTerminalClient`, `FileBackedKVStore`, `SystemTimeSource`
//! (see `adapters`). Testing: `testing` module behind the `test-utils` feature.

use async_trait::async_trait;
use connectivity_bus::NetworkHealth;

use crate::domain::{
    DeliveryFailure, DeliveryReceipt, IncidentReport, KVStoreError, Screen, Timestamp, VoteChoice,
    VotingToken,
};

/// Vote submission endpoint.
#[async_trait]
pub trait VoteGateway: Send + Sync {
    /// Deliver one vote. Only a 2xx answer is a success.
    async fn submit_vote(
        &self,
        token: &VotingToken,
        choice: VoteChoice,
    ) -> Result<DeliveryReceipt, DeliveryFailure>;
}

/// Liveness endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// True if the server answered at all, whatever the status.
    async fn probe(&self) -> bool;
}

/// Incident endpoint. The response is ignored beyond success/failure.
#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Forward one report.
    async fn send(&self, report: &IncidentReport) -> Result<(), DeliveryFailure>;
}

/// Abstract interface for durable key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> Result<Option<String>, KVStoreError>;

    /// Put a single key-value pair, replacing any previous value.
    fn put(&mut self, key: &str, value: &str) -> Result<(), KVStoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), KVStoreError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time in epoch milliseconds.
    fn now(&self) -> Timestamp;
}

/// Terminal UI boundary.
pub trait TerminalView: Send + Sync {
    /// Render vote buttons, retry affordance and message.
    fn render(&self, screen: &Screen);

    /// Render the network status indicator.
    fn render_health(&self, health: NetworkHealth);
}
