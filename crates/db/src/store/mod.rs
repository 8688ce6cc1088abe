//! Session store: the conditional mutation primitives the draw engine
//! builds on.
//!
//! Every compound guarantee (at-most-one-winner draws, one active session
//! per couple) reduces to these operations being individually atomic.
//! Rejection of a conditional mutation is an expected outcome and comes
//! back as `Ok(None)`; `Err` always means the store itself failed.

use async_trait::async_trait;

use pairdeck_core::session::{DrawSession, SessionStatus};
use pairdeck_core::types::{CardId, CoupleId, ParticipantId, SessionId, Timestamp};

pub mod memory;
pub mod postgres;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failures of the store itself, as opposed to rejected mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed session does not exist (or was dropped by a reset).
    #[error("Session not found: {id}")]
    SessionNotFound { id: SessionId },

    /// The backing storage could not serve the request.
    #[error("Session store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Persistence contract for draw sessions.
///
/// Implementations must make each operation atomic: concurrent callers may
/// interleave between calls but never observe a half-applied mutation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The couple's active session, if any. No side effects.
    async fn get_active(&self, couple_id: CoupleId) -> Result<Option<DrawSession>, StoreError>;

    /// Return the couple's active session, creating one seeded with
    /// `full_pool` if none exists. Concurrent callers for the same couple
    /// all receive the same session; at most one is ever created.
    async fn create_if_absent(
        &self,
        couple_id: CoupleId,
        full_pool: Vec<CardId>,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError>;

    /// Conditionally commit a draw: iff the session still has
    /// `expected_status` and `card_id` is still in its pool, move the card
    /// from pool to log, make it current, and return the updated session.
    ///
    /// `Ok(None)` means the condition no longer held (a concurrent draw,
    /// reset, or completion won the race); nothing was mutated.
    async fn try_draw(
        &self,
        session_id: SessionId,
        expected_status: SessionStatus,
        card_id: &str,
        drawn_by: ParticipantId,
        now: Timestamp,
    ) -> Result<Option<DrawSession>, StoreError>;

    /// Clear the session's current card. Idempotent; the draw log is
    /// untouched.
    async fn discard(
        &self,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError>;

    /// Conditionally close a session: iff it is still `Active` with an
    /// empty pool, mark it `Completed` and clear the current card.
    /// `Ok(None)` means the condition no longer held.
    async fn complete(
        &self,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<Option<DrawSession>, StoreError>;

    /// Supersede the couple's active session (if any) and persist a fresh
    /// one seeded with `full_pool`: full pool, empty log, no current card.
    async fn replace(
        &self,
        couple_id: CoupleId,
        full_pool: Vec<CardId>,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError>;
}
