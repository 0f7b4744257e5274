use crate::models::{BriefProfile, InteractionStats, MutualMatch};
use crate::services::directory::ProfileDirectory;
use crate::services::ledger::{InteractionLedger, LedgerError};
use std::collections::HashMap;
use std::sync::Arc;

/// Order of a mutual-match listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl MatchOrder {
    /// `asc` / `oldest` select oldest first; anything else is newest first
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "asc" || v == "oldest" => MatchOrder::OldestFirst,
            _ => MatchOrder::NewestFirst,
        }
    }
}

/// Read-only projection of the ledger into a user's match list
pub struct MatchQueryService {
    ledger: Arc<dyn InteractionLedger>,
    directory: Arc<dyn ProfileDirectory>,
}

impl MatchQueryService {
    pub fn new(ledger: Arc<dyn InteractionLedger>, directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { ledger, directory }
    }

    /// One entry per counterpart, ordered by `matched_at`
    pub async fn list_mutual_matches(
        &self,
        user_id: &str,
        order: MatchOrder,
    ) -> Result<Vec<MutualMatch>, LedgerError> {
        let records = self.ledger.matched_records(user_id).await?;

        // Both rows of a pair are matched; keep the user's own row when present
        let mut by_counterpart: HashMap<String, (uuid::Uuid, chrono::DateTime<chrono::Utc>, bool)> =
            HashMap::new();
        for record in records.iter().filter(|r| r.matched) {
            let Some(other) = record.counterpart_of(user_id) else {
                continue;
            };
            if other == user_id {
                continue;
            }
            let matched_at = record.matched_at.unwrap_or(record.created_at);
            let own = record.sender_id == user_id;

            by_counterpart
                .entry(other.to_string())
                .and_modify(|entry| {
                    if own && !entry.2 {
                        *entry = (record.id, matched_at, own);
                    }
                })
                .or_insert((record.id, matched_at, own));
        }

        let mut matches = Vec::with_capacity(by_counterpart.len());
        for (other_id, (match_id, matched_at, _)) in by_counterpart {
            let other_user = match self.directory.brief_profile(&other_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!("Profile lookup failed for match counterpart {}: {}", other_id, e);
                    BriefProfile::id_only(&other_id)
                }
            };
            matches.push(MutualMatch { match_id, matched_at, other_user });
        }

        matches.sort_by(|a, b| {
            let by_time = match order {
                MatchOrder::NewestFirst => b.matched_at.cmp(&a.matched_at),
                MatchOrder::OldestFirst => a.matched_at.cmp(&b.matched_at),
            };
            by_time.then_with(|| a.other_user.id.cmp(&b.other_user.id))
        });

        tracing::debug!("User {} has {} mutual matches", user_id, matches.len());
        Ok(matches)
    }

    pub async fn stats(&self, user_id: &str) -> Result<InteractionStats, LedgerError> {
        self.ledger.stats(user_id).await
    }
}
