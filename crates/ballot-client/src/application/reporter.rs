//! # Incident Reporter
//!
//! Rate-limited, fire-and-forget forwarding of diagnostic events. A report
//! is either suppressed by the cooldown or handed to a spawned task; the
//! caller never waits on the transport.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use terminal_telemetry::INCIDENTS;
use tokio::task::JoinHandle;

use crate::config::CooldownScope;
use crate::domain::{IncidentKind, IncidentReport, Timestamp};
use crate::ports::{IncidentSink, TimeSource};

/// Dispatch counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReporterStats {
    /// Reports handed to the transport.
    pub dispatched: u64,
    /// Reports dropped by the cooldown.
    pub suppressed: u64,
}

#[derive(Default)]
struct CooldownState {
    last_global: Option<Timestamp>,
    last_by_kind: HashMap<IncidentKind, Timestamp>,
    stats: ReporterStats,
}

/// Best-effort incident notifier.
pub struct IncidentReporter {
    sink: Arc<dyn IncidentSink>,
    clock: Arc<dyn TimeSource>,
    token_hash: String,
    cooldown_ms: u64,
    scope: CooldownScope,
    state: Mutex<CooldownState>,
}

impl IncidentReporter {
    /// Create a reporter for one terminal.
    pub fn new(
        sink: Arc<dyn IncidentSink>,
        clock: Arc<dyn TimeSource>,
        token_hash: impl Into<String>,
        cooldown_ms: u64,
        scope: CooldownScope,
    ) -> Self {
        Self {
            sink,
            clock,
            token_hash: token_hash.into(),
            cooldown_ms,
            scope,
            state: Mutex::new(CooldownState::default()),
        }
    }

    /// Report an incident unless a previous dispatch is within the cooldown.
    ///
    /// Returns the delivery task handle, or `None` when suppressed. Must be
    /// called from within a tokio runtime.
    pub fn report(&self, kind: IncidentKind, detail: &str) -> Option<JoinHandle<()>> {
        if !self.try_acquire(kind) {
            tracing::debug!(kind = %kind, "[bt] incident suppressed by cooldown");
            INCIDENTS.with_label_values(&[kind.as_str(), "suppressed"]).inc();
            return None;
        }

        let report = IncidentReport::new(kind, detail, self.token_hash.clone());
        INCIDENTS.with_label_values(&[kind.as_str(), "dispatched"]).inc();
        tracing::info!(kind = %kind, "[bt] 📣 incident dispatched");

        let sink = Arc::clone(&self.sink);
        Some(tokio::spawn(async move {
            if let Err(e) = sink.send(&report).await {
                tracing::debug!(kind = %report.kind, error = %e, "[bt] incident delivery failed");
            }
        }))
    }

    /// Dispatch/suppression counters.
    pub fn stats(&self) -> ReporterStats {
        self.state.lock().stats
    }

    /// Check and stamp the cooldown window in one critical section.
    fn try_acquire(&self, kind: IncidentKind) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let last = match self.scope {
            CooldownScope::Global => state.last_global,
            CooldownScope::PerKind => state.last_by_kind.get(&kind).copied(),
        };
        if let Some(last) = last {
            if now.millis_since(last) < self.cooldown_ms {
                state.stats.suppressed += 1;
                return false;
            }
        }

        state.last_global = Some(now);
        state.last_by_kind.insert(kind, now);
        state.stats.dispatched += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VotingToken;
    use crate::testing::{ManualTimeSource, RecordingIncidentSink};

    fn reporter(
        scope: CooldownScope,
    ) -> (IncidentReporter, Arc<RecordingIncidentSink>, Arc<ManualTimeSource>) {
        let sink = Arc::new(RecordingIncidentSink::new());
        let clock = Arc::new(ManualTimeSource::new(0));
        let token = VotingToken::new("abc123").unwrap();
        let reporter = IncidentReporter::new(sink.clone(), clock.clone(), token.fingerprint(), 30_000, scope);
        (reporter, sink, clock)
    }

    #[tokio::test]
    async fn test_first_report_dispatched() {
        let (reporter, sink, _clock) = reporter(CooldownScope::Global);
        let handle = reporter.report(IncidentKind::Offline, "navigator offline").unwrap();
        handle.await.unwrap();

        let sent = sink.reports();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, IncidentKind::Offline);
        assert_eq!(sent[0].token_hash, VotingToken::new("abc123").unwrap().fingerprint());
    }

    #[tokio::test]
    async fn test_global_cooldown_spans_kinds() {
        let (reporter, _sink, clock) = reporter(CooldownScope::Global);
        assert!(reporter.report(IncidentKind::Offline, "a").is_some());
        clock.advance_millis(29_999);
        assert!(reporter.report(IncidentKind::VoteSubmitFailed, "b").is_none());
        clock.advance_millis(1);
        assert!(reporter.report(IncidentKind::VoteSubmitFailed, "c").is_some());

        assert_eq!(
            reporter.stats(),
            ReporterStats {
                dispatched: 2,
                suppressed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_per_kind_cooldown() {
        let (reporter, _sink, clock) = reporter(CooldownScope::PerKind);
        assert!(reporter.report(IncidentKind::Offline, "a").is_some());
        assert!(reporter.report(IncidentKind::NetworkOutage, "b").is_some());
        assert!(reporter.report(IncidentKind::Offline, "c").is_none());
        clock.advance_millis(30_000);
        assert!(reporter.report(IncidentKind::Offline, "d").is_some());
    }

    #[tokio::test]
    async fn test_transport_failure_still_starts_cooldown() {
        let (reporter, sink, _clock) = reporter(CooldownScope::Global);
        sink.fail_with(crate::domain::DeliveryFailure::Transport("down".into()));

        reporter.report(IncidentKind::Offline, "a").unwrap().await.unwrap();
        assert!(reporter.report(IncidentKind::Offline, "b").is_none());
        assert_eq!(sink.attempts(), 1);
    }

    #[tokio::test]
    async fn test_detail_is_truncated() {
        let (reporter, sink, _clock) = reporter(CooldownScope::Global);
        let long = "x".repeat(2_000);
        reporter.report(IncidentKind::VoteSubmitFailed, &long).unwrap().await.unwrap();
        assert_eq!(sink.reports()[0].detail.len(), crate::domain::MAX_DETAIL_LEN);
    }
}
