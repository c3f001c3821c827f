//! # Terminal Telemetry
//!
//! Observability for unattended voting terminals.
//!
//! ## Components
//!
//! - Structured logging via `tracing-subscriber` (console or JSON lines)
//! - Prometheus metrics for vote delivery, probes and incidents
//!
//! ## Usage
//!
//! ```rust,ignore
//! use terminal_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BT_SERVICE_NAME` | `ballot-terminal` | Service name in log lines |
//! | `BT_TERMINAL_ID` | `unassigned` | Terminal identifier |
//! | `BT_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `BT_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, StructuredLogger};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, INCIDENTS, NETWORK_HEALTH_STATE,
    PENDING_VOTES, PROBE_RESULTS, VOTES_CONFIRMED, VOTES_SUBMITTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the log subscriber.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let logger = init_logging(&config)?;
    tracing::info!(
        service = logger.service(),
        metric_families = metrics.families(),
        "[bt] telemetry ready"
    );
    Ok(TelemetryGuard { logger, metrics })
}

/// Keeps telemetry alive; logs once when dropped.
pub struct TelemetryGuard {
    logger: StructuredLogger,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// Registered metrics.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = self.logger.service(), "[bt] telemetry stopped");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for setting a gauge.
#[macro_export]
macro_rules! metric_set {
    ($metric:expr, $value:expr) => {
        $metric.set($value)
    };
}
