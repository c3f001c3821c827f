//! # Ballot Client
//!
//! Offline-resilient single-shot ballot submission for unattended voting
//! terminals.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | One tap, one vote | `SubmissionState` rejects submits while in flight or confirmed |
//! | Survives restarts | Pending choice persisted per token before retry is offered |
//! | Same choice on retry | Retry resends the stored choice, never a new one |
//! | Operators notified | Rate-limited, fire-and-forget incident reports |
//! | Outage detection | Watchdog hysteresis: `degraded` at once, `down` after 30 s |
//!
//! ## Module Structure
//!
//! ```text
//! ballot-client/
//! ├── domain/          # Token, choices, pending record, health tracker, errors
//! ├── ports/           # BallotTerminalApi (inbound) + gateways, store, clock, view (outbound)
//! ├── application/     # Store, reporter, watchdog, submission machine, session
//! ├── adapters/        # reqwest client, file/in-memory stores, system clock
//! ├── testing          # Test doubles (feature `test-utils`)
//! └── config.rs        # TerminalConfig
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = TerminalConfig::from_env()?;
//! let deps = SessionDeps::production(&config, view)?;
//! let session = TerminalSession::new(config, VotingToken::new(token)?, deps)?;
//! session.start()?;
//! session.vote(VoteChoice::For).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
#[cfg(feature = "http")]
pub use adapters::HttpTerminalClient;
pub use adapters::{FileBackedKVStore, InMemoryKVStore, SystemTimeSource};
pub use application::{
    IncidentReporter, NetworkWatchdog, PendingVoteStore, ReporterStats, SessionDeps,
    SubmissionMachine, TerminalSession,
};
pub use config::{CooldownScope, PendingChoicePolicy, TerminalConfig};
pub use domain::{
    BallotError, DeliveryFailure, DeliveryReceipt, HealthSnapshot, HealthTracker,
    HealthTransition, IncidentKind, IncidentReport, KVStoreError, PendingVote, Screen,
    ScreenPhase, SubmissionState, SubmitOutcome, Timestamp, VoteChoice, VotingToken,
    INCIDENT_COOLDOWN_MS, MAX_DETAIL_LEN, OUTAGE_THRESHOLD_MS,
};
pub use ports::{
    BallotTerminalApi, HealthProbe, IncidentSink, KeyValueStore, TerminalView, TimeSource,
    VoteGateway,
};

pub use connectivity_bus::{ConnectivityEvent, NetworkHealth};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
