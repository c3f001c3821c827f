//! Telemetry settings, read from `BT_*` environment variables.

const DEFAULT_SERVICE: &str = "ballot-terminal";
const UNASSIGNED: &str = "unassigned";

/// Logging and metrics settings for one terminal process.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Terminal identifier (room, booth, device tag)
    pub terminal_id: String,

    /// `EnvFilter` directive, e.g. `info` or `info,ballot_client=debug`
    pub log_level: String,

    /// JSON lines instead of human-readable output
    pub json_logs: bool,

    /// ANSI colors in human-readable output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE.to_string(),
            terminal_id: UNASSIGNED.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Read the process environment.
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `BT_SERVICE_NAME` | service name |
    /// | `BT_TERMINAL_ID` | terminal identifier |
    /// | `BT_LOG_LEVEL`, then `RUST_LOG` | filter directive |
    /// | `BT_JSON_LOGS` | `true`/`1` for JSON; defaults to on inside a container |
    /// | `NO_COLOR` | disables ANSI colors |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let in_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("BT_SERVICE_NAME").unwrap_or(defaults.service_name),
            terminal_id: lookup("BT_TERMINAL_ID").unwrap_or(defaults.terminal_id),
            log_level: lookup("BT_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("BT_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(in_container),
            ansi: lookup("NO_COLOR").is_none(),
        }
    }

    /// Override the terminal identifier.
    pub fn with_terminal_id(mut self, terminal_id: impl Into<String>) -> Self {
        self.terminal_id = terminal_id.into();
        self
    }

    /// `<service>-<terminal>`, or just the service when no terminal id is set.
    pub fn full_service_name(&self) -> String {
        if self.terminal_id == UNASSIGNED {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.terminal_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = TelemetryConfig::from_lookup(lookup_in(&[]));
        assert_eq!(config.service_name, "ballot-terminal");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert!(config.ansi);
    }

    #[test]
    fn test_log_level_falls_back_to_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup_in(&[("RUST_LOG", "debug")]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_lookup(lookup_in(&[
            ("RUST_LOG", "debug"),
            ("BT_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_json_logs_default_on_in_container() {
        let config = TelemetryConfig::from_lookup(lookup_in(&[("DOCKER_CONTAINER", "1")]));
        assert!(config.json_logs);

        let config = TelemetryConfig::from_lookup(lookup_in(&[
            ("DOCKER_CONTAINER", "1"),
            ("BT_JSON_LOGS", "false"),
        ]));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_no_color_disables_ansi() {
        let config = TelemetryConfig::from_lookup(lookup_in(&[("NO_COLOR", "")]));
        assert!(!config.ansi);
    }

    #[test]
    fn test_full_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.full_service_name(), "ballot-terminal");

        let config = config.with_terminal_id("room-b");
        assert_eq!(config.full_service_name(), "ballot-terminal-room-b");
    }
}
