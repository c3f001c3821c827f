//! Structured logging.
//!
//! Console output for attended debugging, JSON lines for log shippers. Both
//! formats carry the same structured fields emitted by the `tracing` macros.

use tracing_subscriber::EnvFilter;

use crate::{TelemetryConfig, TelemetryError};

/// Structured logger handle
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    /// Service name the logger was initialised for.
    pub fn service(&self) -> &str {
        &self.service
    }
}

/// Install the global `tracing` subscriber.
///
/// Fails if the filter directive cannot be parsed or a global subscriber is
/// already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level '{}': {}", config.log_level, e)))?;

    // stderr: stdout belongs to the terminal display.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json_logs {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_ansi(config.ansi).try_init()
    };
    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let service = config.full_service_name();
    tracing::debug!(
        service = %service,
        json_logs = config.json_logs,
        "[bt] Structured logging configured"
    );

    Ok(StructuredLogger { service })
}
