//! # Watchdog & Incident Scenarios
//!
//! Outage hysteresis under paused tokio time, incident cooldown spacing and
//! the native offline/online signals.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ballot_client::testing::{
        ManualTimeSource, RecordingIncidentSink, ScriptedHealthProbe, ScriptedVoteGateway,
        TokioClock,
    };
    use ballot_client::{
        BallotTerminalApi, ConnectivityEvent, CooldownScope, IncidentKind, IncidentReporter,
        InMemoryKVStore, NetworkHealth, TerminalConfig, INCIDENT_COOLDOWN_MS,
    };
    use connectivity_bus::{EventFilter, EventTopic};

    use crate::integration::{eventually, settle, TerminalRig};

    fn production_timing() -> TerminalConfig {
        TerminalConfig {
            resume_on_recovery: false,
            ..TerminalConfig::default()
        }
    }

    // =========================================================================
    // OUTAGE HYSTERESIS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_six_failed_probes_declare_outage_once() {
        let rig = TerminalRig::build(
            production_timing(),
            Box::new(InMemoryKVStore::new()),
            Arc::new(TokioClock::new(1_700_000_000_000)),
            ScriptedVoteGateway::new(),
            ScriptedHealthProbe::new(false),
        );
        rig.session.start().unwrap();

        // 5 s .. 25 s: failing but not yet 30 s since the last success.
        tokio::time::sleep(Duration::from_millis(25_500)).await;
        settle().await;
        assert_eq!(rig.probe.calls(), 5);
        assert_eq!(rig.session.health().state, NetworkHealth::Degraded);
        assert!(rig.incidents.kinds().is_empty());

        // 30 s: sixth failure crosses the threshold.
        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(rig.probe.calls(), 6);
        assert_eq!(rig.session.health().state, NetworkHealth::Down);
        assert_eq!(rig.incidents.kinds(), vec![IncidentKind::NetworkOutage]);

        // Another minute of failures: still down, no repeat.
        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(rig.session.health().state, NetworkHealth::Down);
        assert_eq!(rig.session.health().consecutive_failures, 18);
        assert_eq!(rig.incidents.kinds(), vec![IncidentKind::NetworkOutage]);
        assert_eq!(
            rig.view.health_updates().last().copied(),
            Some(NetworkHealth::Down)
        );

        rig.session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_after_outage_returns_to_healthy() {
        let rig = TerminalRig::build(
            production_timing(),
            Box::new(InMemoryKVStore::new()),
            Arc::new(TokioClock::new(0)),
            ScriptedVoteGateway::new(),
            ScriptedHealthProbe::new(false),
        );
        let mut transitions = rig
            .session
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Watchdog]));
        rig.session.start().unwrap();

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert_eq!(rig.session.health().state, NetworkHealth::Down);

        rig.probe.set_reachable(true);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rig.session.health().state, NetworkHealth::Healthy);

        let seen: Vec<_> = transitions
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                ConnectivityEvent::HealthChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_eq!(rig.session.bus().last_health(), Some(NetworkHealth::Healthy));
        assert_eq!(
            seen,
            vec![
                (NetworkHealth::Healthy, NetworkHealth::Degraded),
                (NetworkHealth::Degraded, NetworkHealth::Down),
                (NetworkHealth::Down, NetworkHealth::Healthy),
            ]
        );

        rig.session.shutdown().await;
    }

    // =========================================================================
    // INCIDENT COOLDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_incident_dispatches_are_spaced_by_cooldown() {
        let clock = Arc::new(ManualTimeSource::new(0));
        let sink = Arc::new(RecordingIncidentSink::new());
        let reporter = IncidentReporter::new(
            sink.clone(),
            clock.clone(),
            "fp",
            INCIDENT_COOLDOWN_MS,
            CooldownScope::Global,
        );

        let kinds = [
            IncidentKind::Offline,
            IncidentKind::NetworkOutage,
            IncidentKind::VoteSubmitFailed,
        ];
        let mut dispatched_at = Vec::new();
        // One report attempt every 700 ms for three minutes.
        for step in 0..258u64 {
            clock.set_millis(step * 700);
            if let Some(handle) = reporter.report(kinds[step as usize % 3], "flapping") {
                handle.await.unwrap();
                dispatched_at.push(step * 700);
            }
        }

        assert!(dispatched_at.len() >= 5);
        for pair in dispatched_at.windows(2) {
            assert!(
                pair[1] - pair[0] >= INCIDENT_COOLDOWN_MS,
                "dispatches at {} and {} are too close",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(sink.attempts(), dispatched_at.len());
        let stats = reporter.stats();
        assert_eq!(stats.dispatched as usize, dispatched_at.len());
        assert_eq!(stats.dispatched + stats.suppressed, 258);
    }

    #[tokio::test]
    async fn test_failing_incident_endpoint_never_blocks_voting() {
        let rig = TerminalRig::build(
            TerminalConfig::for_testing(),
            Box::new(InMemoryKVStore::new()),
            Arc::new(ManualTimeSource::new(0)),
            ScriptedVoteGateway::offline(),
            ScriptedHealthProbe::new(true),
        );
        rig.incidents
            .fail_with(ballot_client::DeliveryFailure::Transport("refused".into()));

        rig.session
            .vote(ballot_client::VoteChoice::For)
            .await
            .unwrap();
        settle().await;

        assert_eq!(rig.incidents.attempts(), 1);
        assert_eq!(rig.incidents.kinds(), vec![IncidentKind::VoteSubmitFailed]);
        assert!(rig.session.pending().is_some());
    }

    // =========================================================================
    // NATIVE SIGNALS
    // =========================================================================

    #[tokio::test]
    async fn test_offline_signal_goes_down_and_online_probes_back() {
        let rig = TerminalRig::build(
            production_timing(),
            Box::new(InMemoryKVStore::new()),
            Arc::new(ManualTimeSource::new(1_000)),
            ScriptedVoteGateway::new(),
            ScriptedHealthProbe::new(true),
        );
        let mut platform = rig
            .session
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Platform]));
        rig.session.start().unwrap();

        rig.session.notify_offline();
        assert_eq!(platform.try_recv(), Ok(Some(ConnectivityEvent::Offline)));
        eventually(Duration::from_secs(1), || {
            rig.session.health().state == NetworkHealth::Down
        })
        .await;
        eventually(Duration::from_secs(1), || {
            rig.incidents.kinds() == vec![IncidentKind::Offline]
        })
        .await;
        assert_eq!(rig.probe.calls(), 0, "offline needs no probe");

        rig.session.notify_online();
        eventually(Duration::from_secs(1), || {
            rig.session.health().state == NetworkHealth::Healthy
        })
        .await;
        assert_eq!(rig.probe.calls(), 1);
        assert_eq!(rig.session.health().consecutive_failures, 0);

        let bus = rig.session.bus();
        let stats = bus.stats();
        assert_eq!((stats.offline, stats.online), (1, 1));
        assert_eq!(stats.health_changes, 2);
        assert!(bus.subscriber_count() >= 3, "session listeners plus this test");
        assert_eq!(platform.try_recv(), Ok(Some(ConnectivityEvent::Online)));

        rig.session.shutdown().await;
    }
}
