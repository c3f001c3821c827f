//! # Pending-Vote Store
//!
//! Single-slot durable record of an unconfirmed vote, keyed by token.

use parking_lot::Mutex;
use std::sync::Arc;
use terminal_telemetry::{metric_set, PENDING_VOTES};

use crate::domain::{KVStoreError, PendingVote, VoteChoice, VotingToken};
use crate::ports::{KeyValueStore, TimeSource};

/// Per-token pending-vote record over a `KeyValueStore`.
pub struct PendingVoteStore {
    key: String,
    backend: Mutex<Box<dyn KeyValueStore>>,
    clock: Arc<dyn TimeSource>,
}

impl PendingVoteStore {
    /// Bind the store to one token.
    pub fn new(
        token: &VotingToken,
        backend: Box<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            key: token.storage_key(),
            backend: Mutex::new(backend),
            clock,
        }
    }

    /// Write `{choice, now}`, replacing any previous record for this token.
    pub fn save(&self, choice: VoteChoice) -> Result<PendingVote, KVStoreError> {
        let record = PendingVote::new(choice, self.clock.now());
        let encoded = serde_json::to_string(&record).map_err(|e| KVStoreError::Serialization {
            message: e.to_string(),
        })?;
        self.backend.lock().put(&self.key, &encoded)?;
        metric_set!(PENDING_VOTES, 1.0);
        tracing::debug!(choice = %choice, "[bt] pending vote saved");
        Ok(record)
    }

    /// Current record. Unreadable or malformed records count as absent.
    pub fn load(&self) -> Option<PendingVote> {
        let raw = match self.backend.lock().get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "[bt] pending vote unreadable, treating as absent");
                return None;
            }
        };
        match serde_json::from_str::<PendingVote>(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "[bt] pending vote malformed, treating as absent");
                None
            }
        }
    }

    /// Remove the record.
    pub fn clear(&self) -> Result<(), KVStoreError> {
        self.backend.lock().delete(&self.key)?;
        metric_set!(PENDING_VOTES, 0.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKVStore;
    use crate::domain::Timestamp;
    use crate::testing::ManualTimeSource;

    fn store_for(token: &str, kv: &InMemoryKVStore, clock: Arc<ManualTimeSource>) -> PendingVoteStore {
        PendingVoteStore::new(&VotingToken::new(token).unwrap(), Box::new(kv.clone()), clock)
    }

    #[test]
    fn test_save_then_load() {
        let kv = InMemoryKVStore::new();
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let store = store_for("abc123", &kv, clock);

        let saved = store.save(VoteChoice::For).unwrap();
        assert_eq!(saved.captured_at, Timestamp::from_millis(1_000));
        assert_eq!(store.load(), Some(saved));
        assert_eq!(
            kv.get("pending_vote:abc123").unwrap().as_deref(),
            Some(r#"{"vote":"for","at":1000}"#)
        );
    }

    #[test]
    fn test_save_is_single_slot() {
        let kv = InMemoryKVStore::new();
        let clock = Arc::new(ManualTimeSource::new(0));
        let store = store_for("abc123", &kv, clock.clone());

        store.save(VoteChoice::For).unwrap();
        clock.advance_millis(500);
        store.save(VoteChoice::For).unwrap();

        assert_eq!(kv.len(), 1);
        assert_eq!(store.load().unwrap().captured_at, Timestamp::from_millis(500));
    }

    #[test]
    fn test_tokens_do_not_collide() {
        let kv = InMemoryKVStore::new();
        let clock = Arc::new(ManualTimeSource::new(0));
        let a = store_for("abc123", &kv, clock.clone());
        let b = store_for("xyz789", &kv, clock);

        a.save(VoteChoice::For).unwrap();
        assert!(b.load().is_none());
        b.save(VoteChoice::Abstain).unwrap();
        assert_eq!(a.load().unwrap().choice, VoteChoice::For);
    }

    #[test]
    fn test_malformed_record_is_absent() {
        let kv = InMemoryKVStore::new();
        kv.insert_raw("pending_vote:abc123", "{\"vote\":\"maybe\"}");
        let store = store_for("abc123", &kv, Arc::new(ManualTimeSource::new(0)));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_removes_record() {
        let kv = InMemoryKVStore::new();
        let store = store_for("abc123", &kv, Arc::new(ManualTimeSource::new(0)));
        store.save(VoteChoice::Against).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(kv.is_empty());
    }
}
