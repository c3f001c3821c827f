//! # Terminal Configuration
//!
//! Endpoint paths, watchdog timing, incident cooldown, transport timeouts
//! and the policies that resolve the two behavioural choices left open by
//! the submission flow.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{BallotError, DEFAULT_PROBE_INTERVAL_MS, INCIDENT_COOLDOWN_MS, OUTAGE_THRESHOLD_MS};

/// What a tap on a different choice does while a pending vote exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingChoicePolicy {
    /// The stored choice is resent; the new tap only triggers the retry.
    #[default]
    KeepStored,
    /// The new tap replaces the stored choice for that attempt.
    OverwriteOnTap,
}

/// How incident cooldown windows are shared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// One window across all incident kinds.
    #[default]
    Global,
    /// An independent window per kind.
    PerKind,
}

/// Ballot terminal configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Server origin, e.g. `https://vote.example.org`.
    pub base_url: String,

    /// Vote submission path.
    pub vote_path: String,

    /// Liveness probe path.
    pub health_path: String,

    /// Incident report path.
    pub incident_path: String,

    /// Watchdog probe interval.
    pub probe_interval_ms: u64,

    /// Continuous failure after which the network is `down`.
    pub outage_threshold_ms: u64,

    /// Minimum spacing between dispatched incident reports.
    pub incident_cooldown_ms: u64,

    /// Cooldown sharing across incident kinds.
    pub cooldown_scope: CooldownScope,

    /// Different-choice tap while pending.
    pub pending_choice_policy: PendingChoicePolicy,

    /// Whole-request transport timeout.
    pub request_timeout_ms: u64,

    /// TCP connect timeout.
    pub connect_timeout_ms: u64,

    /// Treat a watchdog `down -> healthy` recovery as a reconnect.
    pub resume_on_recovery: bool,

    /// Directory of the pending-vote file.
    pub data_dir: PathBuf,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            vote_path: "/api/vote".to_string(),
            health_path: "/api/health".to_string(),
            incident_path: "/api/incident".to_string(),
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            outage_threshold_ms: OUTAGE_THRESHOLD_MS,
            incident_cooldown_ms: INCIDENT_COOLDOWN_MS,
            cooldown_scope: CooldownScope::Global,
            pending_choice_policy: PendingChoicePolicy::KeepStored,
            request_timeout_ms: 10_000,
            connect_timeout_ms: 3_000,
            resume_on_recovery: true,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl TerminalConfig {
    /// Create a config for testing (short intervals, no recovery resume).
    pub fn for_testing() -> Self {
        Self {
            probe_interval_ms: 50,
            outage_threshold_ms: 300,
            incident_cooldown_ms: 300,
            request_timeout_ms: 1_000,
            connect_timeout_ms: 500,
            resume_on_recovery: false,
            data_dir: std::env::temp_dir().join("ballot-terminal-test"),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `BT_*` environment variables.
    pub fn from_env() -> Result<Self, BallotError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup` (keyed like the environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BallotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("BT_BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = lookup("BT_VOTE_PATH") {
            config.vote_path = v;
        }
        if let Some(v) = lookup("BT_HEALTH_PATH") {
            config.health_path = v;
        }
        if let Some(v) = lookup("BT_INCIDENT_PATH") {
            config.incident_path = v;
        }
        if let Some(v) = lookup("BT_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }

        let millis = |key: &str, slot: &mut u64| -> Result<(), BallotError> {
            if let Some(v) = lookup(key) {
                *slot = v
                    .trim()
                    .parse()
                    .map_err(|_| BallotError::Config(format!("{key} must be milliseconds, got {v:?}")))?;
            }
            Ok(())
        };
        millis("BT_PROBE_INTERVAL_MS", &mut config.probe_interval_ms)?;
        millis("BT_OUTAGE_THRESHOLD_MS", &mut config.outage_threshold_ms)?;
        millis("BT_INCIDENT_COOLDOWN_MS", &mut config.incident_cooldown_ms)?;
        millis("BT_REQUEST_TIMEOUT_MS", &mut config.request_timeout_ms)?;
        millis("BT_CONNECT_TIMEOUT_MS", &mut config.connect_timeout_ms)?;

        if let Some(v) = lookup("BT_COOLDOWN_SCOPE") {
            config.cooldown_scope = match v.trim().to_lowercase().as_str() {
                "global" => CooldownScope::Global,
                "per_kind" | "per-kind" => CooldownScope::PerKind,
                _ => return Err(BallotError::Config(format!("unknown cooldown scope {v:?}"))),
            };
        }
        if let Some(v) = lookup("BT_PENDING_CHOICE_POLICY") {
            config.pending_choice_policy = match v.trim().to_lowercase().as_str() {
                "keep_stored" | "keep-stored" => PendingChoicePolicy::KeepStored,
                "overwrite_on_tap" | "overwrite-on-tap" => PendingChoicePolicy::OverwriteOnTap,
                _ => return Err(BallotError::Config(format!("unknown pending choice policy {v:?}"))),
            };
        }
        if let Some(v) = lookup("BT_RESUME_ON_RECOVERY") {
            config.resume_on_recovery = v == "1" || v.eq_ignore_ascii_case("true");
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the watchdog or transport cannot honour.
    pub fn validate(&self) -> Result<(), BallotError> {
        if self.base_url.trim().is_empty() {
            return Err(BallotError::Config("base_url is empty".into()));
        }
        for (name, path) in [
            ("vote_path", &self.vote_path),
            ("health_path", &self.health_path),
            ("incident_path", &self.incident_path),
        ] {
            if !path.starts_with('/') {
                return Err(BallotError::Config(format!("{name} must start with '/'")));
            }
        }
        if self.probe_interval_ms == 0 {
            return Err(BallotError::Config("probe_interval_ms must be > 0".into()));
        }
        if self.outage_threshold_ms < self.probe_interval_ms {
            return Err(BallotError::Config(
                "outage_threshold_ms must be at least probe_interval_ms".into(),
            ));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(BallotError::Config("transport timeouts must be > 0".into()));
        }
        Ok(())
    }

    /// Probe interval as a `Duration`.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Whole-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Absolute URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Pending-vote file inside `data_dir`.
    pub fn pending_file(&self) -> PathBuf {
        self.data_dir.join("pending_votes.json")
    }
}
