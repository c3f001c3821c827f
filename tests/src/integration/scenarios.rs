//! # Vote Delivery Scenarios
//!
//! End-to-end submission flows: first-attempt success, offline capture,
//! restart with resume, reconnect-driven retry and the single-shot guarantee.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ballot_client::testing::{ManualTimeSource, ScriptedHealthProbe, ScriptedVoteGateway};
    use ballot_client::{
        BallotError, BallotTerminalApi, FileBackedKVStore, IncidentKind, InMemoryKVStore,
        PendingChoicePolicy, ScreenPhase, SubmissionState, SubmitOutcome, TerminalConfig,
        VoteChoice,
    };

    use crate::integration::{eventually, settle, TerminalRig, TOKEN};

    fn memory_rig(kv: &InMemoryKVStore, gateway: ScriptedVoteGateway) -> TerminalRig {
        TerminalRig::build(
            TerminalConfig::for_testing(),
            Box::new(kv.clone()),
            Arc::new(ManualTimeSource::new(1_700_000_000_000)),
            gateway,
            ScriptedHealthProbe::new(true),
        )
    }

    // =========================================================================
    // FIRST ATTEMPT
    // =========================================================================

    #[tokio::test]
    async fn test_success_on_first_attempt_leaves_no_trace() {
        let kv = InMemoryKVStore::new();
        let rig = memory_rig(&kv, ScriptedVoteGateway::new());
        rig.session.start().unwrap();

        let outcome = rig.session.vote(VoteChoice::For).await.unwrap();
        settle().await;

        assert_eq!(outcome, SubmitOutcome::Confirmed { choice: VoteChoice::For });
        assert!(kv.is_empty(), "no record may be written on success");
        assert_eq!(rig.incidents.attempts(), 0, "no incident on success");
        assert_eq!(rig.gateway.tokens(), vec![TOKEN.to_string()]);

        let screen = rig.view.last_screen().unwrap();
        assert_eq!(screen.message, "Vote enregistré");
        assert!(!screen.buttons_enabled);
        rig.session.shutdown().await;
    }

    // =========================================================================
    // OFFLINE -> RESTART -> ONLINE
    // =========================================================================

    #[tokio::test]
    async fn test_offline_vote_survives_restart_and_resumes_on_online() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending_votes.json");

        // First run: the network is gone.
        {
            let store = FileBackedKVStore::open(&path).unwrap();
            let rig = TerminalRig::build(
                TerminalConfig::for_testing(),
                Box::new(store),
                Arc::new(ManualTimeSource::new(1_000)),
                ScriptedVoteGateway::offline(),
                ScriptedHealthProbe::new(false),
            );
            rig.session.start().unwrap();
            rig.session.notify_offline();

            let outcome = rig.session.vote(VoteChoice::For).await.unwrap();
            assert!(matches!(outcome, SubmitOutcome::Pending { choice: VoteChoice::For, .. }));
            assert_eq!(rig.session.pending().unwrap().choice, VoteChoice::For);
            settle().await;
            assert!(rig.incidents.kinds().contains(&IncidentKind::Offline)
                || rig.incidents.kinds().contains(&IncidentKind::VoteSubmitFailed));

            rig.session.shutdown().await;
        }

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("pending_vote:abc123"));
        assert!(on_disk.contains(r#"\"vote\":\"for\""#));

        // Second run: the terminal restarts before the network returns.
        let store = FileBackedKVStore::open(&path).unwrap();
        let rig = TerminalRig::build(
            TerminalConfig::for_testing(),
            Box::new(store),
            Arc::new(ManualTimeSource::new(60_000)),
            ScriptedVoteGateway::offline(),
            ScriptedHealthProbe::new(true),
        );

        let screen = rig.view.screens().first().cloned().unwrap();
        assert_eq!(screen.phase, ScreenPhase::Resumable);
        assert_eq!(screen.retry_choice, Some(VoteChoice::For));
        assert_eq!(rig.session.state(), SubmissionState::Idle);

        rig.session.start().unwrap();
        rig.gateway.set_online();
        rig.session.notify_online();

        eventually(Duration::from_secs(2), || rig.session.state().is_confirmed()).await;

        assert_eq!(rig.gateway.delivered_choices(), vec![VoteChoice::For]);
        assert!(rig.session.pending().is_none());
        let screen = rig.view.last_screen().unwrap();
        assert_eq!(screen.message, "Vote enregistré");
        assert!(!screen.buttons_enabled);

        assert!(matches!(
            rig.session.vote(VoteChoice::Against).await,
            Err(BallotError::AlreadyConfirmed)
        ));
        assert_eq!(rig.gateway.call_count(), 1);
        rig.session.shutdown().await;
    }

    // =========================================================================
    // RETRY INVARIANTS
    // =========================================================================

    #[tokio::test]
    async fn test_delivered_choice_always_matches_first_choice() {
        for failures in 0..5usize {
            for first in VoteChoice::ALL {
                let kv = InMemoryKVStore::new();
                let gateway = ScriptedVoteGateway::new();
                for n in 0..failures {
                    if n % 2 == 0 {
                        gateway.push_rejection(502, "bad gateway");
                    } else {
                        gateway.push(Err(ballot_client::DeliveryFailure::Transport("reset".into())));
                    }
                }
                let rig = memory_rig(&kv, gateway);

                // Voter taps a different button on every retry; the stored choice wins.
                let mut outcome = rig.session.vote(first).await.unwrap();
                let mut taps = VoteChoice::ALL.iter().cycle();
                while !matches!(outcome, SubmitOutcome::Confirmed { .. }) {
                    assert_eq!(rig.session.pending().map(|p| p.choice), Some(first));
                    outcome = rig.session.vote(*taps.next().unwrap()).await.unwrap();
                }

                assert_eq!(outcome, SubmitOutcome::Confirmed { choice: first });
                assert_eq!(rig.gateway.delivered_choices(), vec![first; failures + 1]);
                assert!(kv.is_empty(), "record destroyed once delivered");
            }
        }
    }

    #[tokio::test]
    async fn test_record_survives_every_failure() {
        let kv = InMemoryKVStore::new();
        let rig = memory_rig(&kv, ScriptedVoteGateway::offline());

        rig.session.vote(VoteChoice::Abstain).await.unwrap();
        for _ in 0..3 {
            rig.session.retry().await.unwrap();
            assert_eq!(kv.len(), 1, "at most one record per token");
            assert_eq!(rig.session.pending().unwrap().choice, VoteChoice::Abstain);
        }
    }

    #[tokio::test]
    async fn test_overwrite_policy_replaces_pending_choice() {
        let kv = InMemoryKVStore::new();
        let config = TerminalConfig {
            pending_choice_policy: PendingChoicePolicy::OverwriteOnTap,
            ..TerminalConfig::for_testing()
        };
        let rig = TerminalRig::build(
            config,
            Box::new(kv.clone()),
            Arc::new(ManualTimeSource::new(0)),
            ScriptedVoteGateway::offline(),
            ScriptedHealthProbe::new(true),
        );

        rig.session.vote(VoteChoice::For).await.unwrap();
        rig.gateway.set_online();
        let outcome = rig.session.vote(VoteChoice::Against).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Confirmed { choice: VoteChoice::Against });
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_ignored_at_start_up() {
        let kv = InMemoryKVStore::new();
        kv.insert_raw("pending_vote:abc123", "not json at all");
        let rig = memory_rig(&kv, ScriptedVoteGateway::new());

        assert_eq!(rig.view.last_screen().unwrap().phase, ScreenPhase::Ready);
        assert!(matches!(rig.session.retry().await, Err(BallotError::NothingPending)));

        let outcome = rig.session.vote(VoteChoice::Against).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Confirmed { choice: VoteChoice::Against });
    }

    #[tokio::test]
    async fn test_each_token_has_its_own_record() {
        let kv = InMemoryKVStore::new();
        kv.insert_raw("pending_vote:someone-else", r#"{"vote":"against","at":1}"#);
        let rig = memory_rig(&kv, ScriptedVoteGateway::new());

        assert!(rig.session.pending().is_none());
        rig.session.vote(VoteChoice::For).await.unwrap();
        assert_eq!(kv.len(), 1, "other token's record untouched");
    }
}
