//! Draw session entity and its pure state transitions.
//!
//! A session is the shared deck state of one couple: the undrawn pool, the
//! append-only draw log, and the currently revealed card. The transitions
//! here are plain functions over `&mut DrawSession`; atomicity (who gets to
//! commit a transition under concurrency) is the store's responsibility.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::types::{CardId, CoupleId, ParticipantId, SessionId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Session lifecycle status.
///
/// `Active` sessions accept draws. `Completed` is the explicit close of an
/// exhausted deck. `Superseded` marks a session replaced by reset; it is a
/// tombstone and is never returned as the couple's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Superseded,
}

impl SessionStatus {
    /// Storage representation, also the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Superseded => "superseded",
        }
    }

    /// Parse the storage representation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "superseded" => Some(SessionStatus::Superseded),
            _ => None,
        }
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or_else(|| format!("unknown session status '{raw}'"))
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// One committed draw. Log entries are append-only and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawEntry {
    pub card_id: CardId,
    pub drawn_by: ParticipantId,
    pub drawn_at: Timestamp,
}

/// The shared deck state of one couple. At most one `Active` session exists
/// per couple at any time.
///
/// Invariants maintained by the transitions below:
/// - `pool` and the log's card ids are disjoint.
/// - `current`, when set, equals the last log entry's card id.
/// - `log` only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawSession {
    pub id: SessionId,
    pub couple_id: CoupleId,
    /// Undrawn card ids. Set semantics: no duplicates, order irrelevant.
    pub pool: Vec<CardId>,
    pub log: Vec<DrawEntry>,
    pub current: Option<CardId>,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DrawSession {
    /// A fresh `Active` session holding the full pool, nothing drawn.
    pub fn new(couple_id: CoupleId, pool: Vec<CardId>, now: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            couple_id,
            pool,
            log: Vec::new(),
            current: None,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// True once every card has been drawn.
    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty()
    }

    /// Pick a draw candidate uniformly at random from the remaining pool.
    ///
    /// This is only a candidate: the commit happens in the store, which
    /// re-checks membership so a concurrent draw of the same card cannot
    /// win twice.
    pub fn pick_candidate(&self) -> Option<&CardId> {
        self.pool.choose(&mut rand::rng())
    }

    /// Conditionally commit a draw.
    ///
    /// Succeeds iff `status == expected_status` and `card_id` is still in
    /// the pool; then the card moves from pool to log and becomes current.
    /// Returns `false` with the session untouched otherwise.
    pub fn apply_draw(
        &mut self,
        expected_status: SessionStatus,
        card_id: &str,
        drawn_by: ParticipantId,
        now: Timestamp,
    ) -> bool {
        if self.status != expected_status {
            return false;
        }
        let Some(position) = self.pool.iter().position(|id| id == card_id) else {
            return false;
        };

        let card_id = self.pool.swap_remove(position);
        self.log.push(DrawEntry {
            card_id: card_id.clone(),
            drawn_by,
            drawn_at: now,
        });
        self.current = Some(card_id);
        self.updated_at = now;
        true
    }

    /// Put the revealed card face-down again. Idempotent; the log keeps the
    /// draw either way.
    pub fn clear_current(&mut self, now: Timestamp) {
        if self.current.take().is_some() {
            self.updated_at = now;
        }
    }

    /// Explicitly close an exhausted session.
    ///
    /// Succeeds iff the session is `Active` with an empty pool. Returns
    /// `false` with the session untouched otherwise.
    pub fn apply_complete(&mut self, now: Timestamp) -> bool {
        if self.status != SessionStatus::Active || !self.pool.is_empty() {
            return false;
        }
        self.status = SessionStatus::Completed;
        self.current = None;
        self.updated_at = now;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
