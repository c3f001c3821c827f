//! Prometheus metrics for ballot terminals.
//!
//! Names follow `bt_<area>_<what>[_total]`. The collectors are process-wide
//! statics so any crate can record without threading a handle through.

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{CounterVec, Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Registry every terminal metric is registered with
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Delivery attempts, `outcome` = confirmed | failed
    pub static ref VOTES_SUBMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("bt_votes_submitted_total", "Vote delivery attempts"),
        &["outcome"]
    ).expect("valid metric definition");

    /// Votes acknowledged by the server
    pub static ref VOTES_CONFIRMED: IntCounter = IntCounter::new(
        "bt_votes_confirmed_total",
        "Votes acknowledged by the server"
    ).expect("valid metric definition");

    /// 1 while this terminal holds an undelivered vote
    pub static ref PENDING_VOTES: Gauge = Gauge::new(
        "bt_pending_votes",
        "Pending vote records awaiting delivery"
    ).expect("valid metric definition");

    // =========================================================================
    // WATCHDOG
    // =========================================================================

    /// Probe outcomes, `result` = reachable | unreachable
    pub static ref PROBE_RESULTS: IntCounterVec = IntCounterVec::new(
        Opts::new("bt_probe_results_total", "Liveness probe results"),
        &["result"]
    ).expect("valid metric definition");

    /// 0 healthy, 1 degraded, 2 down
    pub static ref NETWORK_HEALTH_STATE: Gauge = Gauge::new(
        "bt_network_health_state",
        "Network health classification"
    ).expect("valid metric definition");

    // =========================================================================
    // INCIDENTS
    // =========================================================================

    /// Incident reports, `outcome` = dispatched | suppressed
    pub static ref INCIDENTS: CounterVec = CounterVec::new(
        Opts::new("bt_incidents_total", "Incident reports"),
        &["kind", "outcome"]
    ).expect("valid metric definition");
}

fn collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(VOTES_SUBMITTED.clone()),
        Box::new(VOTES_CONFIRMED.clone()),
        Box::new(PENDING_VOTES.clone()),
        Box::new(PROBE_RESULTS.clone()),
        Box::new(NETWORK_HEALTH_STATE.clone()),
        Box::new(INCIDENTS.clone()),
    ]
}

/// Proof that the terminal metrics are registered.
#[derive(Debug)]
pub struct MetricsHandle {
    families: usize,
}

impl MetricsHandle {
    /// Number of metric families registered.
    pub fn families(&self) -> usize {
        self.families
    }

    /// Current values in Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        encode_metrics()
    }
}

/// Register every terminal metric with [`REGISTRY`]. Idempotent.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let all = collectors();
    let families = all.len();
    for collector in all {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(MetricsHandle { families })
}

/// Gather [`REGISTRY`] into Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_idempotent() {
        let first = register_metrics().expect("register");
        let second = register_metrics().expect("register again");
        assert_eq!(first.families(), 6);
        assert_eq!(second.families(), first.families());
    }

    #[test]
    fn test_labelled_counter_increments() {
        let before = VOTES_SUBMITTED.with_label_values(&["failed"]).get();
        VOTES_SUBMITTED.with_label_values(&["failed"]).inc();
        assert!(VOTES_SUBMITTED.with_label_values(&["failed"]).get() > before);
    }

    #[test]
    fn test_encoded_text_names_terminal_metrics() {
        let handle = register_metrics().expect("register");
        VOTES_CONFIRMED.inc();
        INCIDENTS.with_label_values(&["offline", "dispatched"]).inc();

        let text = handle.encode().expect("encode");
        assert!(text.contains("bt_votes_confirmed_total"));
        assert!(text.contains(r#"kind="offline""#));
    }
}
