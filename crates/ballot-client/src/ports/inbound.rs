//! # Inbound Ports
//!
//! What a voting terminal can be asked to do.

use async_trait::async_trait;

use crate::domain::{
    BallotError, HealthSnapshot, PendingVote, SubmissionState, SubmitOutcome, VoteChoice,
};

/// Ballot terminal API - inbound port.
///
/// Implemented by `TerminalSession`. Platform lifecycle signals arrive
/// through `notify_online` / `notify_offline`.
#[async_trait]
pub trait BallotTerminalApi: Send + Sync {
    /// A vote button was tapped.
    ///
    /// Resolves once the delivery attempt completes.
    async fn vote(&self, choice: VoteChoice) -> Result<SubmitOutcome, BallotError>;

    /// The retry affordance was tapped; resends the stored choice.
    async fn retry(&self) -> Result<SubmitOutcome, BallotError>;

    /// Platform reported connectivity.
    fn notify_online(&self);

    /// Platform reported loss of connectivity.
    fn notify_offline(&self);

    /// Current submission state.
    fn state(&self) -> SubmissionState;

    /// Current pending record, if any.
    fn pending(&self) -> Option<PendingVote>;

    /// Current watchdog view.
    fn health(&self) -> HealthSnapshot;
}
