//! PostgreSQL session store.
//!
//! Every conditional mutation is a single `UPDATE ... WHERE ... RETURNING`
//! statement, so the membership check and the mutation commit together or
//! not at all. There is no read-then-write anywhere in this file.

use sqlx::PgPool;

use pairdeck_core::session::{DrawSession, SessionStatus};
use pairdeck_core::types::{CardId, CoupleId, ParticipantId, SessionId, Timestamp};

use crate::models::SessionRow;

use super::{SessionStore, StoreError};

/// Column list for `draw_sessions` queries.
const COLUMNS: &str =
    "id, couple_id, pool, log, current_card, status, created_at, updated_at";

/// Session store backed by the `draw_sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a fresh active session; `None` when the couple already holds
    /// the active slot (partial unique index `uq_draw_sessions_couple_active`).
    async fn insert_active(
        &self,
        session: &DrawSession,
    ) -> Result<Option<DrawSession>, StoreError> {
        let query = format!(
            "INSERT INTO draw_sessions \
                 (id, couple_id, pool, log, current_card, status, created_at, updated_at) \
             VALUES ($1, $2, $3, '[]'::jsonb, NULL, $4, $5, $5) \
             ON CONFLICT (couple_id) WHERE status = 'active' DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session.id)
            .bind(session.couple_id)
            .bind(&session.pool)
            .bind(SessionStatus::Active.as_str())
            .bind(session.created_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    async fn get_active(&self, couple_id: CoupleId) -> Result<Option<DrawSession>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM draw_sessions WHERE couple_id = $1 AND status = $2"
        );
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(couple_id)
            .bind(SessionStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn create_if_absent(
        &self,
        couple_id: CoupleId,
        full_pool: Vec<CardId>,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError> {
        // Each pass either observes an active session or wins the insert;
        // the only way around both is a reset committing in between, which
        // the next pass then observes.
        loop {
            if let Some(existing) = self.get_active(couple_id).await? {
                return Ok(existing);
            }
            let fresh = DrawSession::new(couple_id, full_pool.clone(), now);
            if let Some(created) = self.insert_active(&fresh).await? {
                return Ok(created);
            }
            tracing::debug!(%couple_id, "lost session creation race, re-reading");
        }
    }

    async fn try_draw(
        &self,
        session_id: SessionId,
        expected_status: SessionStatus,
        card_id: &str,
        drawn_by: ParticipantId,
        now: Timestamp,
    ) -> Result<Option<DrawSession>, StoreError> {
        let query = format!(
            "UPDATE draw_sessions \
             SET pool = array_remove(pool, $3), \
                 log = log || jsonb_build_object( \
                     'card_id', $3::text, \
                     'drawn_by', $4::uuid, \
                     'drawn_at', $5::timestamptz), \
                 current_card = $3, \
                 updated_at = $5 \
             WHERE id = $1 AND status = $2 AND $3 = ANY(pool) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_id)
            .bind(expected_status.as_str())
            .bind(card_id)
            .bind(drawn_by)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn discard(
        &self,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError> {
        // updated_at moves only when there was a card to clear.
        let query = format!(
            "UPDATE draw_sessions \
             SET updated_at = CASE WHEN current_card IS NULL THEN updated_at ELSE $2 END, \
                 current_card = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Into::into)
            .ok_or(StoreError::SessionNotFound { id: session_id })
    }

    async fn complete(
        &self,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<Option<DrawSession>, StoreError> {
        let query = format!(
            "UPDATE draw_sessions \
             SET status = $2, current_card = NULL, updated_at = $3 \
             WHERE id = $1 AND status = $4 AND cardinality(pool) = 0 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_id)
            .bind(SessionStatus::Completed.as_str())
            .bind(now)
            .bind(SessionStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn replace(
        &self,
        couple_id: CoupleId,
        full_pool: Vec<CardId>,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError> {
        loop {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "UPDATE draw_sessions \
                 SET status = $2, current_card = NULL, updated_at = $3 \
                 WHERE couple_id = $1 AND status = $4",
            )
            .bind(couple_id)
            .bind(SessionStatus::Superseded.as_str())
            .bind(now)
            .bind(SessionStatus::Active.as_str())
            .execute(&mut *tx)
            .await?;

            let fresh = DrawSession::new(couple_id, full_pool.clone(), now);
            let insert = format!(
                "INSERT INTO draw_sessions \
                     (id, couple_id, pool, log, current_card, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, '[]'::jsonb, NULL, $4, $5, $5) \
                 ON CONFLICT (couple_id) WHERE status = 'active' DO NOTHING \
                 RETURNING {COLUMNS}"
            );
            let inserted = sqlx::query_as::<_, SessionRow>(&insert)
                .bind(fresh.id)
                .bind(fresh.couple_id)
                .bind(&fresh.pool)
                .bind(SessionStatus::Active.as_str())
                .bind(fresh.created_at)
                .fetch_optional(&mut *tx)
                .await?;

            match inserted {
                Some(row) => {
                    tx.commit().await?;
                    return Ok(row.into());
                }
                // A concurrent reset committed its fresh session between our
                // statements; drop ours and surface the committed one.
                None => {
                    drop(tx);
                    if let Some(existing) = self.get_active(couple_id).await? {
                        return Ok(existing);
                    }
                    tracing::debug!(%couple_id, "lost session replace race, retrying");
                }
            }
        }
    }
}
