//! # Value Objects
//!
//! Immutable values: timestamps, the voting token, vote choices and
//! incident kinds.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::errors::BallotError;
use super::invariants::PENDING_KEY_PREFIX;

/// Wall-clock instant in epoch milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create from epoch milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Epoch milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, zero if the clock went backwards.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// This instant shifted forward.
    pub fn plus_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

/// Opaque single-use voter authorization, fixed for a session.
///
/// The raw value only leaves the terminal in the vote request itself;
/// storage keys embed it and incident reports carry a fingerprint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VotingToken(String);

impl VotingToken {
    /// Wrap a token exactly as supplied. Blank tokens are rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, BallotError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(BallotError::InvalidToken);
        }
        Ok(Self(raw))
    }

    /// Raw token, for the vote request only.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key of this token's pending record.
    pub fn storage_key(&self) -> String {
        format!("{}{}", PENDING_KEY_PREFIX, self.0)
    }

    /// First 16 hex chars of SHA-256(token).
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut fp = hex::encode(digest);
        fp.truncate(16);
        fp
    }
}

// Debug never prints the raw token.
impl fmt::Debug for VotingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VotingToken").field(&self.fingerprint()).finish()
    }
}

/// The value a voter selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    /// In favour.
    For,
    /// Opposed.
    Against,
    /// Abstention.
    Abstain,
}

impl VoteChoice {
    /// All choices in button order.
    pub const ALL: [VoteChoice; 3] = [VoteChoice::For, VoteChoice::Against, VoteChoice::Abstain];

    /// Wire value sent in the `vote` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
            Self::Abstain => "abstain",
        }
    }

    /// Button label shown on the terminal.
    pub fn label(&self) -> &'static str {
        match self {
            Self::For => "Pour",
            Self::Against => "Contre",
            Self::Abstain => "Abstention",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteChoice {
    type Err = BallotError;

    /// Accepts wire values and the French button labels, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "for" | "pour" => Ok(Self::For),
            "against" | "contre" => Ok(Self::Against),
            "abstain" | "abstention" => Ok(Self::Abstain),
            other => Err(BallotError::InvalidChoice(other.to_string())),
        }
    }
}

/// Incident categories forwarded to operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    /// Probes failed continuously past the outage threshold.
    #[serde(rename = "network_30s")]
    NetworkOutage,
    /// The platform reported loss of connectivity.
    #[serde(rename = "offline")]
    Offline,
    /// A vote delivery attempt failed.
    #[serde(rename = "vote_submit_failed")]
    VoteSubmitFailed,
}

impl IncidentKind {
    /// Wire value of the `kind` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkOutage => "network_30s",
            Self::Offline => "offline",
            Self::VoteSubmitFailed => "vote_submit_failed",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejects_blank() {
        assert!(matches!(VotingToken::new("   "), Err(BallotError::InvalidToken)));
        assert!(matches!(VotingToken::new(""), Err(BallotError::InvalidToken)));
    }

    #[test]
    fn test_storage_key_is_token_scoped() {
        let a = VotingToken::new("abc123").unwrap();
        let b = VotingToken::new("abc124").unwrap();
        assert_eq!(a.storage_key(), "pending_vote:abc123");
        assert_ne!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let token = VotingToken::new("abc123").unwrap();
        let fp = token.fingerprint();
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, VotingToken::new("abc123").unwrap().fingerprint());
        assert!(!fp.contains("abc123"));
    }

    #[test]
    fn test_token_with_edge_whitespace_is_kept_verbatim() {
        let padded = VotingToken::new(" abc123\t").unwrap();
        assert_eq!(padded.as_str(), " abc123\t");
        assert_eq!(padded.storage_key(), "pending_vote: abc123\t");
        assert_ne!(
            padded.fingerprint(),
            VotingToken::new("abc123").unwrap().fingerprint()
        );
    }

    #[test]
    fn test_debug_hides_raw_token() {
        let token = VotingToken::new("secret-token").unwrap();
        assert!(!format!("{:?}", token).contains("secret-token"));
    }

    #[test]
    fn test_choice_parsing() {
        assert_eq!("FOR".parse::<VoteChoice>().unwrap(), VoteChoice::For);
        assert_eq!("contre".parse::<VoteChoice>().unwrap(), VoteChoice::Against);
        assert_eq!(" abstain ".parse::<VoteChoice>().unwrap(), VoteChoice::Abstain);
        assert!(matches!(
            "maybe".parse::<VoteChoice>(),
            Err(BallotError::InvalidChoice(_))
        ));
    }

    #[test]
    fn test_incident_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&IncidentKind::NetworkOutage).unwrap(),
            "\"network_30s\""
        );
        assert_eq!(IncidentKind::VoteSubmitFailed.as_str(), "vote_submit_failed");
    }

    #[test]
    fn test_timestamp_saturates() {
        let early = Timestamp::from_millis(10);
        let late = Timestamp::from_millis(25);
        assert_eq!(late.millis_since(early), 15);
        assert_eq!(early.millis_since(late), 0);
    }
}
