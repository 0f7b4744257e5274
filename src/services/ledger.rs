use crate::models::{InteractionRecord, InteractionStats};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors that can occur when reading or writing the interaction ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Interaction from {sender} to {receiver} already recorded")]
    DuplicateInteraction { sender: String, receiver: String },

    #[error("Cannot interact with yourself: {0}")]
    SelfInteraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ledger invariant violated: {0}")]
    Inconsistent(String),

    #[error("SQLx error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Durable store of one-directional interaction records
///
/// At most one record exists per ordered `(sender, receiver)` pair, and a
/// record's `matched` flag only ever changes together with its reciprocal.
#[async_trait]
pub trait InteractionLedger: Send + Sync {
    /// Insert a new record; a second record for the same ordered pair fails
    /// with [`LedgerError::DuplicateInteraction`] and leaves the first intact.
    async fn record_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
        liked: bool,
    ) -> Result<InteractionRecord, LedgerError>;

    async fn find_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Option<InteractionRecord>, LedgerError>;

    /// Atomically flag both records as matched
    ///
    /// Compare-and-set: succeeds only while both records are liked and
    /// unmatched. Returns `true` when this call performed the transition and
    /// `false` when both were already matched.
    async fn mark_mutual_match(&self, id_a: Uuid, id_b: Uuid) -> Result<bool, LedgerError>;

    /// All matched records where `user_id` is sender or receiver
    async fn matched_records(&self, user_id: &str) -> Result<Vec<InteractionRecord>, LedgerError>;

    async fn stats(&self, user_id: &str) -> Result<InteractionStats, LedgerError>;

    async fn health_check(&self) -> Result<bool, LedgerError>;
}

#[derive(Default)]
struct LedgerState {
    records: HashMap<(String, String), InteractionRecord>,
    by_id: HashMap<Uuid, (String, String)>,
    stats: HashMap<String, InteractionStats>,
}

impl LedgerState {
    fn stats_mut(&mut self, user_id: &str) -> &mut InteractionStats {
        self.stats
            .entry(user_id.to_string())
            .or_insert_with(|| InteractionStats {
                user_id: user_id.to_string(),
                ..InteractionStats::default()
            })
    }
}

/// Process-local ledger
///
/// Every mutation happens under one write lock, which makes the pair
/// update in [`InteractionLedger::mark_mutual_match`] a single atomic step.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl InteractionLedger for InMemoryLedger {
    async fn record_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
        liked: bool,
    ) -> Result<InteractionRecord, LedgerError> {
        if sender_id == receiver_id {
            return Err(LedgerError::SelfInteraction(sender_id.to_string()));
        }

        let key = (sender_id.to_string(), receiver_id.to_string());
        let mut state = self.state.write().await;

        if state.records.contains_key(&key) {
            return Err(LedgerError::DuplicateInteraction {
                sender: sender_id.to_string(),
                receiver: receiver_id.to_string(),
            });
        }

        let record = InteractionRecord::new(sender_id, receiver_id, liked);
        state.by_id.insert(record.id, key.clone());
        state.records.insert(key, record.clone());
        if liked {
            state.stats_mut(receiver_id).likes_received += 1;
        }

        tracing::debug!("Recorded interaction {} -> {} (liked: {})", sender_id, receiver_id, liked);
        Ok(record)
    }

    async fn find_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Option<InteractionRecord>, LedgerError> {
        let key = (sender_id.to_string(), receiver_id.to_string());
        Ok(self.state.read().await.records.get(&key).cloned())
    }

    async fn mark_mutual_match(&self, id_a: Uuid, id_b: Uuid) -> Result<bool, LedgerError> {
        let mut state = self.state.write().await;

        let key_a = state
            .by_id
            .get(&id_a)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id_a.to_string()))?;
        let key_b = state
            .by_id
            .get(&id_b)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id_b.to_string()))?;

        if key_a.0 != key_b.1 || key_a.1 != key_b.0 {
            return Err(LedgerError::Inconsistent(format!(
                "{} and {} are not reciprocal records",
                id_a, id_b
            )));
        }

        let (a, b) = match (state.records.get(&key_a), state.records.get(&key_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(LedgerError::Inconsistent("index points at a missing record".into())),
        };

        if !a.liked || !b.liked {
            return Err(LedgerError::Inconsistent(format!(
                "cannot match {} and {}: both sides must be liked",
                id_a, id_b
            )));
        }
        match (a.matched, b.matched) {
            (true, true) => return Ok(false),
            (false, false) => {}
            _ => {
                return Err(LedgerError::Inconsistent(format!(
                    "{} and {} disagree on matched",
                    id_a, id_b
                )))
            }
        }

        let now = Utc::now();
        for key in [&key_a, &key_b] {
            if let Some(record) = state.records.get_mut(key) {
                record.matched = true;
                record.matched_at = Some(now);
            }
        }
        state.stats_mut(&key_a.0).matches += 1;
        state.stats_mut(&key_b.0).matches += 1;

        Ok(true)
    }

    async fn matched_records(&self, user_id: &str) -> Result<Vec<InteractionRecord>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.matched && (r.sender_id == user_id || r.receiver_id == user_id))
            .cloned()
            .collect())
    }

    async fn stats(&self, user_id: &str) -> Result<InteractionStats, LedgerError> {
        let state = self.state.read().await;
        Ok(state.stats.get(user_id).cloned().unwrap_or_else(|| InteractionStats {
            user_id: user_id.to_string(),
            ..InteractionStats::default()
        }))
    }

    async fn health_check(&self) -> Result<bool, LedgerError> {
        Ok(true)
    }
}
