use std::sync::Arc;

use pairdeck_core::card::{Card, Catalog};
use pairdeck_core::session::DrawSession;
use pairdeck_core::types::{CardId, CoupleId, ParticipantId};
use pairdeck_db::SessionStore;
use pairdeck_events::{EventBus, SessionEvent};

use super::DrawError;

/// A successful draw: the updated session plus the resolved card content.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub session: DrawSession,
    pub card: Card,
}

/// Logic layer between participant requests and the session store.
///
/// Holds only shared handles; every call reads the session fresh and lets
/// the store's conditional commit arbitrate races. On success the outcome
/// is published on the event bus so the relay can mirror it to the
/// partner's connection.
pub struct DrawCoordinator {
    store: Arc<dyn SessionStore>,
    catalog: Arc<Catalog>,
    bus: Arc<EventBus>,
}

impl DrawCoordinator {
    pub fn new(store: Arc<dyn SessionStore>, catalog: Arc<Catalog>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            catalog,
            bus,
        }
    }

    /// Every catalog card id, as a pool seed.
    fn full_pool(&self) -> Vec<CardId> {
        self.catalog.all_card_ids().into_iter().collect()
    }

    /// The couple's active session, lazily created with the full catalog
    /// as pool if none exists.
    pub async fn get_or_create_session(
        &self,
        couple_id: CoupleId,
    ) -> Result<DrawSession, DrawError> {
        let session = self
            .store
            .create_if_absent(couple_id, self.full_pool(), chrono::Utc::now())
            .await?;
        Ok(session)
    }

    /// Draw one card for `participant_id`.
    ///
    /// Picks uniformly at random from the last-read pool and asks the store
    /// to commit conditionally. A lost race comes back as
    /// [`DrawError::DrawConflict`]; the caller decides whether to draw
    /// again, it is never retried silently here.
    pub async fn draw(
        &self,
        couple_id: CoupleId,
        participant_id: ParticipantId,
    ) -> Result<DrawOutcome, DrawError> {
        let session = self.get_or_create_session(couple_id).await?;

        let card_id = session
            .pick_candidate()
            .cloned()
            .ok_or(DrawError::DeckExhausted)?;

        // The pool was seeded from an earlier catalog generation; if the
        // card vanished from the deck since then, the whole session is
        // stale and must be reset, not patched around.
        let card = self
            .catalog
            .resolve(&card_id)
            .cloned()
            .ok_or(DrawError::StaleCatalog {
                card_id: card_id.clone(),
            })?;

        let committed = self
            .store
            .try_draw(
                session.id,
                session.status,
                &card_id,
                participant_id,
                chrono::Utc::now(),
            )
            .await?;

        let Some(updated) = committed else {
            tracing::debug!(%couple_id, card_id = %card_id, "draw lost the commit race");
            return Err(DrawError::DrawConflict);
        };

        tracing::info!(
            %couple_id,
            participant_id = %participant_id,
            card_id = %card_id,
            remaining = updated.pool.len(),
            "card drawn"
        );
        self.bus.publish(SessionEvent::revealed(
            Some(participant_id),
            card.clone(),
            updated.clone(),
        ));

        Ok(DrawOutcome {
            session: updated,
            card,
        })
    }

    /// Put the revealed card face-down again. Idempotent.
    pub async fn discard(
        &self,
        couple_id: CoupleId,
        participant_id: ParticipantId,
    ) -> Result<DrawSession, DrawError> {
        let session = self
            .store
            .get_active(couple_id)
            .await?
            .ok_or(DrawError::SessionNotFound)?;

        let updated = self.store.discard(session.id, chrono::Utc::now()).await?;

        tracing::info!(%couple_id, participant_id = %participant_id, "card discarded");
        self.bus
            .publish(SessionEvent::cleared(Some(participant_id), updated.clone()));

        Ok(updated)
    }

    /// Replace the couple's session with a fresh full deck.
    ///
    /// Any reveal state on either client is invalidated by the published
    /// cleared event.
    pub async fn reset(
        &self,
        couple_id: CoupleId,
        participant_id: ParticipantId,
    ) -> Result<DrawSession, DrawError> {
        let fresh = self
            .store
            .replace(couple_id, self.full_pool(), chrono::Utc::now())
            .await?;

        tracing::info!(
            %couple_id,
            participant_id = %participant_id,
            pool = fresh.pool.len(),
            "session reset"
        );
        self.bus
            .publish(SessionEvent::cleared(Some(participant_id), fresh.clone()));

        Ok(fresh)
    }

    /// Explicitly close an exhausted session.
    ///
    /// Requires the pool to be empty; afterwards no session is active and
    /// the next request starts a fresh one.
    pub async fn complete(
        &self,
        couple_id: CoupleId,
        participant_id: ParticipantId,
    ) -> Result<DrawSession, DrawError> {
        let session = self
            .store
            .get_active(couple_id)
            .await?
            .ok_or(DrawError::SessionNotFound)?;

        if !session.is_exhausted() {
            return Err(DrawError::DeckNotExhausted);
        }

        let completed = self
            .store
            .complete(session.id, chrono::Utc::now())
            .await?
            // The session changed under us (reset or a parallel complete).
            .ok_or(DrawError::DrawConflict)?;

        tracing::info!(%couple_id, participant_id = %participant_id, "session completed");
        self.bus
            .publish(SessionEvent::cleared(Some(participant_id), completed.clone()));

        Ok(completed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
