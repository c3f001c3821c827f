//! # Domain Invariants
//!
//! Constants and rules that must always hold true.

use super::entities::PendingVote;
use super::value_objects::{Timestamp, VoteChoice};

/// Default watchdog probe interval.
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 5_000;

/// Continuous probe failure after which the network is `down`.
pub const OUTAGE_THRESHOLD_MS: u64 = 30_000;

/// Minimum spacing between two dispatched incident reports.
pub const INCIDENT_COOLDOWN_MS: u64 = 30_000;

/// Longest diagnostic detail forwarded in an incident or kept from a response body.
pub const MAX_DETAIL_LEN: usize = 512;

/// Prefix of the per-token storage key.
pub const PENDING_KEY_PREFIX: &str = "pending_vote:";

/// Invariant: a retry resends exactly the stored choice.
pub fn invariant_retry_choice(stored: &PendingVote, resent: VoteChoice) -> bool {
    stored.choice == resent
}

/// Invariant: `down` only after the outage threshold has fully elapsed.
pub fn invariant_outage_elapsed(last_healthy: Timestamp, now: Timestamp, threshold_ms: u64) -> bool {
    now.millis_since(last_healthy) >= threshold_ms
}

/// Truncate diagnostic text on a char boundary.
pub fn truncate_detail(detail: &str) -> String {
    if detail.len() <= MAX_DETAIL_LEN {
        return detail.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !detail.is_char_boundary(end) {
        end -= 1;
    }
    detail[..end].to_string()
}
