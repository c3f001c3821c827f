//! # Domain Errors
//!
//! Error types for ballot submission.

use thiserror::Error;

/// Ballot client error types.
///
/// None of these are fatal to a terminal: every variant leaves the session in
/// a state from which a human can still act.
#[derive(Debug, Error)]
pub enum BallotError {
    /// The voting token is empty or whitespace.
    #[error("Voting token is empty")]
    InvalidToken,

    /// The tapped value is not a known vote choice.
    #[error("Unknown vote choice: {0}")]
    InvalidChoice(String),

    /// The vote was already acknowledged; this client never re-arms.
    #[error("Vote already confirmed")]
    AlreadyConfirmed,

    /// A delivery attempt is still outstanding.
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    /// Retry requested but no pending vote exists.
    #[error("No pending vote to retry")]
    NothingPending,

    /// Local durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] KVStoreError),

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Background tasks were already started for this session.
    #[error("Session already started")]
    AlreadyStarted,
}

/// Why a delivery (vote or incident) did not succeed.
///
/// `Display` is the diagnostic detail forwarded in incident reports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Network or transport error (no HTTP response).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl DeliveryFailure {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KVStoreError {
    /// Filesystem failure.
    #[error("I/O error: {message}")]
    IOError {
        /// Underlying error text
        message: String,
    },

    /// Record could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying error text
        message: String,
    },

    /// Another process holds the store.
    #[error("Store locked by another process: {path}")]
    Locked {
        /// Lock file path
        path: String,
    },
}
