use crate::models::{BriefProfile, NotificationEvent, PairKey};
use crate::services::directory::{DirectoryError, ProfileDirectory};
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::ledger::{InteractionLedger, LedgerError};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Errors returned by [`MatchDetector::process_interaction`]
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Interaction from {sender} to {receiver} already recorded")]
    DuplicateInteraction { sender: String, receiver: String },

    #[error("Cannot interact with yourself")]
    SelfInteraction,

    #[error("Unknown party: {0}")]
    UnknownParty(String),

    #[error("Ledger failure: {0}")]
    Persistence(LedgerError),

    #[error("Directory failure: {0}")]
    Directory(DirectoryError),
}

impl From<LedgerError> for MatchError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateInteraction { sender, receiver } => {
                MatchError::DuplicateInteraction { sender, receiver }
            }
            LedgerError::SelfInteraction(_) => MatchError::SelfInteraction,
            other => MatchError::Persistence(other),
        }
    }
}

/// Outcome of one like or pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionOutcome {
    pub matched: bool,
}

/// Table of async locks keyed by unordered pair
///
/// Entries exist only while some task holds or waits on the pair's lock.
#[derive(Default)]
pub struct PairLocks {
    locks: DashMap<PairKey, Arc<Mutex<()>>>,
}

/// Held pair lock; dropping it releases the pair and prunes the table
pub struct PairGuard<'a> {
    owner: &'a PairLocks,
    key: PairKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, a: &str, b: &str) -> PairGuard<'_> {
        let key = PairKey::new(a, b);
        let mutex = {
            let entry = self.locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };

        let guard = mutex.lock_owned().await;
        PairGuard {
            owner: self,
            key,
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the table's own reference left: nobody holds or waits
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Decides, per like, whether a mutual match now exists
///
/// The record → reciprocal lookup → mark sequence runs under the pair's
/// lock, so two simultaneous likes between the same users resolve to one
/// match. The ledger's compare-and-set covers processes that do not share
/// this lock table: whoever loses the CAS reports the match without
/// notifying again.
pub struct MatchDetector {
    ledger: Arc<dyn InteractionLedger>,
    directory: Arc<dyn ProfileDirectory>,
    dispatcher: NotificationDispatcher,
    locks: PairLocks,
}

impl MatchDetector {
    pub fn new(
        ledger: Arc<dyn InteractionLedger>,
        directory: Arc<dyn ProfileDirectory>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            ledger,
            directory,
            dispatcher,
            locks: PairLocks::new(),
        }
    }

    pub fn pending_pairs(&self) -> usize {
        self.locks.len()
    }

    pub async fn process_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
        liked: bool,
    ) -> Result<InteractionOutcome, MatchError> {
        if sender_id == receiver_id {
            return Err(MatchError::SelfInteraction);
        }

        match self.directory.brief_profile(receiver_id).await {
            Ok(_) => {}
            Err(DirectoryError::NotFound(_)) => {
                return Err(MatchError::UnknownParty(receiver_id.to_string()));
            }
            Err(e) => return Err(MatchError::Directory(e)),
        }

        let transition = {
            let _pair = self.locks.lock(sender_id, receiver_id).await;

            let record = self.ledger.record_interaction(sender_id, receiver_id, liked).await?;

            if !liked {
                tracing::debug!("{} passed on {}", sender_id, receiver_id);
                return Ok(InteractionOutcome { matched: false });
            }

            match self.ledger.find_interaction(receiver_id, sender_id).await? {
                Some(reciprocal) if reciprocal.liked => {
                    let performed = self.ledger.mark_mutual_match(record.id, reciprocal.id).await?;
                    Transition::Matched { performed }
                }
                _ => Transition::Liked,
            }
        };

        // Delivery happens outside the pair lock and never fails the call
        match transition {
            Transition::Liked => {
                let from = self.profile_or_id(sender_id).await;
                self.dispatcher
                    .publish(receiver_id, &NotificationEvent::like(receiver_id, from));
                Ok(InteractionOutcome { matched: false })
            }
            Transition::Matched { performed: true } => {
                tracing::info!("Mutual match: {} <-> {}", sender_id, receiver_id);
                let sender = self.profile_or_id(sender_id).await;
                let receiver = self.profile_or_id(receiver_id).await;
                self.dispatcher
                    .publish(sender_id, &NotificationEvent::matched(sender_id, receiver));
                self.dispatcher
                    .publish(receiver_id, &NotificationEvent::matched(receiver_id, sender));
                Ok(InteractionOutcome { matched: true })
            }
            Transition::Matched { performed: false } => {
                tracing::debug!("Match {} <-> {} already recorded elsewhere", sender_id, receiver_id);
                Ok(InteractionOutcome { matched: true })
            }
        }
    }

    async fn profile_or_id(&self, user_id: &str) -> BriefProfile {
        match self.directory.brief_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Using id-only payload for {}: {}", user_id, e);
                BriefProfile::id_only(user_id)
            }
        }
    }
}

enum Transition {
    Liked,
    Matched { performed: bool },
}
