//! # Integration Fixtures
//!
//! `TerminalRig` builds a `TerminalSession` over scripted transports so
//! scenarios can flip connectivity and inspect exactly what reached the
//! vote and incident endpoints.

pub mod scenarios;
pub mod watchdog;

use std::sync::Arc;
use std::time::Duration;

use ballot_client::testing::{
    RecordingIncidentSink, RecordingView, ScriptedHealthProbe, ScriptedVoteGateway,
};
use ballot_client::{
    KeyValueStore, SessionDeps, TerminalConfig, TerminalSession, TimeSource, VotingToken,
};

/// Token used by every scenario.
pub const TOKEN: &str = "abc123";

/// A session plus handles on every test double behind it.
pub struct TerminalRig {
    /// Session under test.
    pub session: TerminalSession,
    /// Vote endpoint.
    pub gateway: Arc<ScriptedVoteGateway>,
    /// Liveness endpoint.
    pub probe: Arc<ScriptedHealthProbe>,
    /// Incident endpoint.
    pub incidents: Arc<RecordingIncidentSink>,
    /// Screen recorder.
    pub view: Arc<RecordingView>,
}

impl TerminalRig {
    /// Build (but do not start) a session.
    pub fn build(
        config: TerminalConfig,
        store: Box<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
        gateway: ScriptedVoteGateway,
        probe: ScriptedHealthProbe,
    ) -> Self {
        let gateway = Arc::new(gateway);
        let probe = Arc::new(probe);
        let incidents = Arc::new(RecordingIncidentSink::new());
        let view = Arc::new(RecordingView::new());

        let deps = SessionDeps {
            gateway: gateway.clone(),
            probe: probe.clone(),
            incidents: incidents.clone(),
            store,
            clock,
            view: view.clone(),
        };
        let token = VotingToken::new(TOKEN).expect("fixture token is valid");
        let session = TerminalSession::new(config, token, deps).expect("fixture config is valid");

        Self {
            session,
            gateway,
            probe,
            incidents,
            view,
        }
    }
}

/// Poll `cond` until it holds, failing the test after `within`.
pub async fn eventually<F: Fn() -> bool>(within: Duration, cond: F) {
    let polled = tokio::time::timeout(within, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not reached within {:?}", within);
}

/// Let spawned incident tasks run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
