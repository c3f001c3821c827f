//! # Submission State Machine
//!
//! Orchestrates one logical vote cast for a terminal's token.
//!
//! ```text
//! submit/retry ──▶ [lock] check state, pick choice, Submitting{attempt} [unlock]
//!              ──▶ gateway.submit_vote().await
//!              ──▶ [lock] attempt still current? commit outcome [unlock]
//!              ──▶ storage, incident, view
//! ```
//!
//! The state lock is never held across the delivery `.await`.

use parking_lot::Mutex;
use std::sync::Arc;
use terminal_telemetry::{metric_inc, VOTES_CONFIRMED, VOTES_SUBMITTED};

use crate::application::pending_store::PendingVoteStore;
use crate::application::reporter::IncidentReporter;
use crate::config::PendingChoicePolicy;
use crate::domain::invariants::invariant_retry_choice;
use crate::domain::{
    BallotError, DeliveryFailure, DeliveryReceipt, IncidentKind, PendingVote, Screen,
    SubmissionState, SubmitOutcome, VoteChoice, VotingToken,
};
use crate::ports::{TerminalView, VoteGateway};

struct MachineState {
    state: SubmissionState,
    next_attempt: u64,
}

/// Single-shot vote submission for one token.
pub struct SubmissionMachine {
    token: VotingToken,
    gateway: Arc<dyn VoteGateway>,
    store: PendingVoteStore,
    reporter: Arc<IncidentReporter>,
    view: Arc<dyn TerminalView>,
    policy: PendingChoicePolicy,
    inner: Mutex<MachineState>,
}

impl SubmissionMachine {
    /// Create an idle machine. Call `restore` before accepting taps.
    pub fn new(
        token: VotingToken,
        gateway: Arc<dyn VoteGateway>,
        store: PendingVoteStore,
        reporter: Arc<IncidentReporter>,
        view: Arc<dyn TerminalView>,
        policy: PendingChoicePolicy,
    ) -> Self {
        Self {
            token,
            gateway,
            store,
            reporter,
            view,
            policy,
            inner: Mutex::new(MachineState {
                state: SubmissionState::Idle,
                next_attempt: 1,
            }),
        }
    }

    /// Reconstruct start-up state: the resume affordance if a record exists,
    /// plain vote buttons otherwise.
    pub fn restore(&self) -> Option<PendingVote> {
        let pending = self.store.load();
        match pending {
            Some(record) => {
                tracing::info!(
                    token_fp = %self.token.fingerprint(),
                    choice = %record.choice,
                    captured_at = record.captured_at.as_millis(),
                    "[bt] ⏸️ pending vote found, offering resume"
                );
                self.view.render(&Screen::resumable(record.choice));
            }
            None => self.view.render(&Screen::ready()),
        }
        pending
    }

    /// Current state.
    pub fn state(&self) -> SubmissionState {
        self.inner.lock().state.clone()
    }

    /// Current durable record.
    pub fn pending(&self) -> Option<PendingVote> {
        self.store.load()
    }

    /// A vote button was tapped.
    pub async fn submit(&self, choice: VoteChoice) -> Result<SubmitOutcome, BallotError> {
        let stored = self.store.load().map(|r| r.choice);
        let (choice, attempt) = self.begin(|state| {
            let pending = stored.or(match state {
                SubmissionState::FailedPending { choice, .. } => Some(*choice),
                _ => None,
            });
            match (self.policy, pending) {
                (PendingChoicePolicy::KeepStored, Some(kept)) => {
                    if kept != choice {
                        tracing::info!(
                            tapped = %choice,
                            kept = %kept,
                            "[bt] pending vote kept, resending stored choice"
                        );
                    }
                    Ok(kept)
                }
                _ => Ok(choice),
            }
        })?;
        Ok(self.deliver(choice, attempt).await)
    }

    /// The retry affordance was tapped, or connectivity came back.
    pub async fn retry(&self) -> Result<SubmitOutcome, BallotError> {
        let stored = self.store.load();
        let (choice, attempt) = self.begin(|state| match (state, &stored) {
            (_, Some(record)) => Ok(record.choice),
            (SubmissionState::FailedPending { choice, .. }, None) => Ok(*choice),
            _ => Err(BallotError::NothingPending),
        })?;
        if let Some(record) = &stored {
            debug_assert!(invariant_retry_choice(record, choice));
        }
        Ok(self.deliver(choice, attempt).await)
    }

    /// Check and enter `Submitting` in one critical section.
    fn begin<F>(&self, pick: F) -> Result<(VoteChoice, u64), BallotError>
    where
        F: FnOnce(&SubmissionState) -> Result<VoteChoice, BallotError>,
    {
        let mut inner = self.inner.lock();
        match inner.state {
            SubmissionState::Submitting { .. } => return Err(BallotError::SubmissionInFlight),
            SubmissionState::Confirmed { .. } => return Err(BallotError::AlreadyConfirmed),
            SubmissionState::Idle | SubmissionState::FailedPending { .. } => {}
        }
        let choice = pick(&inner.state)?;
        let attempt = inner.next_attempt;
        inner.next_attempt += 1;
        inner.state = SubmissionState::Submitting { choice, attempt };
        drop(inner);

        self.view.render(&Screen::submitting(choice));
        tracing::info!(
            token_fp = %self.token.fingerprint(),
            choice = %choice,
            attempt,
            "[bt] 🗳️ submitting vote"
        );
        Ok((choice, attempt))
    }

    async fn deliver(&self, choice: VoteChoice, attempt: u64) -> SubmitOutcome {
        let result = self.gateway.submit_vote(&self.token, choice).await;
        self.complete(attempt, choice, result)
    }

    /// Commit a delivery result if `attempt` is still the current one.
    fn complete(
        &self,
        attempt: u64,
        choice: VoteChoice,
        result: Result<DeliveryReceipt, DeliveryFailure>,
    ) -> SubmitOutcome {
        {
            let mut inner = self.inner.lock();
            let current = matches!(
                inner.state,
                SubmissionState::Submitting { attempt: a, .. } if a == attempt
            );
            if !current {
                tracing::debug!(attempt, state = inner.state.name(), "[bt] stale delivery result discarded");
                return SubmitOutcome::Discarded;
            }
            inner.state = match &result {
                Ok(_) => SubmissionState::Confirmed { choice },
                Err(failure) => SubmissionState::FailedPending {
                    choice,
                    failure: failure.clone(),
                },
            };
        }

        match result {
            Ok(receipt) => {
                metric_inc!(VOTES_SUBMITTED, &["confirmed"]);
                metric_inc!(VOTES_CONFIRMED);
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "[bt] confirmed vote could not be cleared from storage");
                }
                tracing::info!(
                    token_fp = %self.token.fingerprint(),
                    choice = %choice,
                    attempt,
                    status = receipt.status,
                    "[bt] ✅ vote confirmed"
                );
                self.view.render(&Screen::confirmed());
                SubmitOutcome::Confirmed { choice }
            }
            Err(failure) => {
                metric_inc!(VOTES_SUBMITTED, &["failed"]);
                if let Err(e) = self.store.save(choice) {
                    tracing::warn!(error = %e, "[bt] pending vote could not be persisted");
                }
                tracing::warn!(
                    token_fp = %self.token.fingerprint(),
                    choice = %choice,
                    attempt,
                    error = %failure,
                    "[bt] ❌ vote delivery failed, pending retry"
                );
                self.reporter
                    .report(IncidentKind::VoteSubmitFailed, &failure.to_string());
                self.view.render(&Screen::failed(choice));
                SubmitOutcome::Pending { choice, failure }
            }
        }
    }
}
