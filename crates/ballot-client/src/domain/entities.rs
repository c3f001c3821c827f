//! # Domain Entities
//!
//! Pending vote records, incident reports, the submission state and the
//! screen model rendered by the terminal view.

use serde::{Deserialize, Serialize};

use super::errors::DeliveryFailure;
use super::invariants::truncate_detail;
use super::value_objects::{IncidentKind, Timestamp, VoteChoice};

/// Unconfirmed vote persisted after a failed delivery.
///
/// Serialized as `{ "vote": "<choice>", "at": <epoch-millis> }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVote {
    /// The choice that must eventually be delivered.
    #[serde(rename = "vote")]
    pub choice: VoteChoice,
    /// When the failed attempt was recorded.
    #[serde(rename = "at")]
    pub captured_at: Timestamp,
}

impl PendingVote {
    /// Create a new record.
    pub fn new(choice: VoteChoice, captured_at: Timestamp) -> Self {
        Self {
            choice,
            captured_at,
        }
    }
}

/// Diagnostic event forwarded to operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentReport {
    /// Incident category.
    pub kind: IncidentKind,
    /// Free-form diagnostic text, truncated.
    pub detail: String,
    /// Token fingerprint, never the raw token.
    pub token_hash: String,
}

impl IncidentReport {
    /// Build a report, truncating the detail.
    pub fn new(kind: IncidentKind, detail: &str, token_hash: impl Into<String>) -> Self {
        Self {
            kind,
            detail: truncate_detail(detail),
            token_hash: token_hash.into(),
        }
    }
}

/// Server acknowledgement of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// 2xx status returned by the server.
    pub status: u16,
}

/// Submission state machine.
///
/// ```text
/// Idle ──submit──▶ Submitting ──2xx──▶ Confirmed (terminal)
///                     │   ▲
///               fail  ▼   │ retry / online
///                 FailedPending
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    /// No request in flight, nothing delivered yet.
    Idle,
    /// One delivery attempt outstanding.
    Submitting {
        /// Choice being delivered
        choice: VoteChoice,
        /// Attempt id guarding against stale completions
        attempt: u64,
    },
    /// Last attempt failed; the choice is persisted for retry.
    FailedPending {
        /// Persisted choice
        choice: VoteChoice,
        /// Why the last attempt failed
        failure: DeliveryFailure,
    },
    /// Server acknowledged the vote; the machine never re-arms.
    Confirmed {
        /// Delivered choice
        choice: VoteChoice,
    },
}

impl SubmissionState {
    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting { .. } => "submitting",
            Self::FailedPending { .. } => "failed-pending",
            Self::Confirmed { .. } => "confirmed",
        }
    }

    /// True when `submit` is accepted from this state.
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::FailedPending { .. })
    }

    /// True once the vote is confirmed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Result of a completed `submit` / `retry` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Server acknowledged the choice.
    Confirmed {
        /// Delivered choice
        choice: VoteChoice,
    },
    /// Delivery failed; the choice is pending.
    Pending {
        /// Persisted choice
        choice: VoteChoice,
        /// Failure detail
        failure: DeliveryFailure,
    },
    /// The state moved on while the request was in flight; result ignored.
    Discarded,
}

/// What the terminal should currently display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenPhase {
    /// Vote buttons offered.
    Ready,
    /// A pending vote from a previous run can be resumed.
    Resumable,
    /// Request in flight.
    Submitting,
    /// Last attempt failed, retry offered.
    RetryOffered,
    /// Vote recorded.
    Confirmed,
}

/// Screen model handed to the terminal view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    /// Current phase.
    pub phase: ScreenPhase,
    /// Whether the vote buttons accept taps.
    pub buttons_enabled: bool,
    /// Choice a retry/resume affordance would resend.
    pub retry_choice: Option<VoteChoice>,
    /// Message shown to the voter.
    pub message: String,
}

impl Screen {
    /// Buttons enabled, nothing pending.
    pub fn ready() -> Self {
        Self {
            phase: ScreenPhase::Ready,
            buttons_enabled: true,
            retry_choice: None,
            message: "Choisissez votre vote".to_string(),
        }
    }

    /// Pending vote found at start-up.
    pub fn resumable(choice: VoteChoice) -> Self {
        Self {
            phase: ScreenPhase::Resumable,
            buttons_enabled: true,
            retry_choice: Some(choice),
            message: format!("Vote « {} » en attente d'envoi", choice.label()),
        }
    }

    /// Buttons disabled, retry affordance hidden.
    pub fn submitting(choice: VoteChoice) -> Self {
        Self {
            phase: ScreenPhase::Submitting,
            buttons_enabled: false,
            retry_choice: None,
            message: format!("Envoi du vote « {} »…", choice.label()),
        }
    }

    /// Buttons re-enabled, retry offered.
    pub fn failed(choice: VoteChoice) -> Self {
        Self {
            phase: ScreenPhase::RetryOffered,
            buttons_enabled: true,
            retry_choice: Some(choice),
            message: "Échec de l'envoi, touchez Réessayer".to_string(),
        }
    }

    /// Terminal success: buttons stay disabled.
    pub fn confirmed() -> Self {
        Self {
            phase: ScreenPhase::Confirmed,
            buttons_enabled: false,
            retry_choice: None,
            message: "Vote enregistré".to_string(),
        }
    }
}
