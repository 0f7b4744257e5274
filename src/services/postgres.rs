use crate::models::{InteractionRecord, InteractionStats};
use crate::services::ledger::{InteractionLedger, LedgerError};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed interaction ledger
///
/// The `(sender_id, receiver_id)` unique constraint enforces one record per
/// ordered pair. Match transitions and the counters they drive run in one
/// transaction.
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Connect and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, LedgerError> {
        tracing::info!("Connecting to PostgreSQL ledger");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn record_from_row(row: &PgRow) -> InteractionRecord {
    InteractionRecord {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        liked: row.get("liked"),
        matched: row.get("matched"),
        created_at: row.get("created_at"),
        matched_at: row.get("matched_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl InteractionLedger for PostgresLedger {
    async fn record_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
        liked: bool,
    ) -> Result<InteractionRecord, LedgerError> {
        if sender_id == receiver_id {
            return Err(LedgerError::SelfInteraction(sender_id.to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO interactions (id, sender_id, receiver_id, liked)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, receiver_id, liked, matched, created_at, matched_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(liked)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                return Err(LedgerError::DuplicateInteraction {
                    sender: sender_id.to_string(),
                    receiver: receiver_id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if liked {
            sqlx::query(
                r#"
                INSERT INTO interaction_stats (user_id, likes_received)
                VALUES ($1, 1)
                ON CONFLICT (user_id)
                DO UPDATE SET likes_received = interaction_stats.likes_received + 1
                "#,
            )
            .bind(receiver_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!("Recorded interaction {} -> {} (liked: {})", sender_id, receiver_id, liked);
        Ok(record_from_row(&row))
    }

    async fn find_interaction(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Option<InteractionRecord>, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, liked, matched, created_at, matched_at
            FROM interactions
            WHERE sender_id = $1 AND receiver_id = $2
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn mark_mutual_match(&self, id_a: Uuid, id_b: Uuid) -> Result<bool, LedgerError> {
        let mut tx = self.pool.begin().await?;

        // Row locks on both records serialise concurrent transitions across processes
        let rows = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, liked, matched
            FROM interactions
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(vec![id_a, id_b])
        .fetch_all(&mut *tx)
        .await?;

        if rows.len() != 2 {
            return Err(LedgerError::NotFound(format!("{} / {}", id_a, id_b)));
        }

        let senders: Vec<String> = rows.iter().map(|r| r.get("sender_id")).collect();
        let receivers: Vec<String> = rows.iter().map(|r| r.get("receiver_id")).collect();
        if senders[0] != receivers[1] || senders[1] != receivers[0] {
            return Err(LedgerError::Inconsistent(format!(
                "{} and {} are not reciprocal records",
                id_a, id_b
            )));
        }
        if !rows.iter().all(|r| r.get::<bool, _>("liked")) {
            return Err(LedgerError::Inconsistent(format!(
                "cannot match {} and {}: both sides must be liked",
                id_a, id_b
            )));
        }

        let matched: Vec<bool> = rows.iter().map(|r| r.get("matched")).collect();
        match (matched[0], matched[1]) {
            (true, true) => return Ok(false),
            (false, false) => {}
            _ => {
                return Err(LedgerError::Inconsistent(format!(
                    "{} and {} disagree on matched",
                    id_a, id_b
                )))
            }
        }

        // NOW() is fixed per transaction, so both rows share one matched_at
        sqlx::query(
            r#"
            UPDATE interactions
            SET matched = TRUE, matched_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(vec![id_a, id_b])
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO interaction_stats (user_id, matches)
            SELECT unnest($1::text[]), 1
            ON CONFLICT (user_id)
            DO UPDATE SET matches = interaction_stats.matches + 1
            "#,
        )
        .bind(senders.clone())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Marked mutual match: {} <-> {}", senders[0], senders[1]);
        Ok(true)
    }

    async fn matched_records(&self, user_id: &str) -> Result<Vec<InteractionRecord>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, liked, matched, created_at, matched_at
            FROM interactions
            WHERE matched = TRUE AND (sender_id = $1 OR receiver_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn stats(&self, user_id: &str) -> Result<InteractionStats, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT likes_received, matches
            FROM interaction_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => InteractionStats {
                user_id: user_id.to_string(),
                likes_received: row.get("likes_received"),
                matches: row.get("matches"),
            },
            None => InteractionStats {
                user_id: user_id.to_string(),
                ..InteractionStats::default()
            },
        })
    }

    async fn health_check(&self) -> Result<bool, LedgerError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
