//! In-memory session store.
//!
//! The default store for tests and single-node deployments without a
//! database. One `RwLock` over the whole map gives every operation the
//! same atomicity the Postgres store gets from single-statement updates:
//! a conditional check and its mutation always happen under one write
//! guard.

use std::collections::HashMap;

use tokio::sync::RwLock;

use pairdeck_core::session::{DrawSession, SessionStatus};
use pairdeck_core::types::{CardId, CoupleId, ParticipantId, SessionId, Timestamp};

use super::{SessionStore, StoreError};

/// Keyed by couple; holds each couple's latest session regardless of
/// status. A superseded session is simply dropped, so "not found" and
/// "superseded" collapse into the same outcome here.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<CoupleId, DrawSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_active(&self, couple_id: CoupleId) -> Result<Option<DrawSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&couple_id)
            .filter(|s| s.status == SessionStatus::Active)
            .cloned())
    }

    async fn create_if_absent(
        &self,
        couple_id: CoupleId,
        full_pool: Vec<CardId>,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&couple_id) {
            Some(existing) if existing.status == SessionStatus::Active => Ok(existing.clone()),
            _ => {
                let fresh = DrawSession::new(couple_id, full_pool, now);
                sessions.insert(couple_id, fresh.clone());
                Ok(fresh)
            }
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
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.values_mut().find(|s| s.id == session_id) else {
            // Dropped by a reset since the caller read it: a lost race.
            return Ok(None);
        };
        if session.apply_draw(expected_status, card_id, drawn_by, now) {
            Ok(Some(session.clone()))
        } else {
            Ok(None)
        }
    }

    async fn discard(
        &self,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.values_mut().find(|s| s.id == session_id) else {
            return Err(StoreError::SessionNotFound { id: session_id });
        };
        session.clear_current(now);
        Ok(session.clone())
    }

    async fn complete(
        &self,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<Option<DrawSession>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.values_mut().find(|s| s.id == session_id) else {
            return Ok(None);
        };
        if session.apply_complete(now) {
            Ok(Some(session.clone()))
        } else {
            Ok(None)
        }
    }

    async fn replace(
        &self,
        couple_id: CoupleId,
        full_pool: Vec<CardId>,
        now: Timestamp,
    ) -> Result<DrawSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        let fresh = DrawSession::new(couple_id, full_pool, now);
        sessions.insert(couple_id, fresh.clone());
        Ok(fresh)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn pool(ids: &[&str]) -> Vec<CardId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn now() -> Timestamp {
        chrono::Utc::now()
    }

    // -- get_active / create_if_absent -------------------------------------

    #[tokio::test]
    async fn get_active_is_none_for_unknown_couple() {
        let store = MemorySessionStore::new();
        let found = store.get_active(uuid::Uuid::new_v4()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn create_if_absent_creates_once() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();

        let first = store
            .create_if_absent(couple, pool(&["a", "b"]), now())
            .await
            .unwrap();
        let second = store
            .create_if_absent(couple, pool(&["a", "b"]), now())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.get_active(couple).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn concurrent_creates_converge_on_one_session() {
        let store = Arc::new(MemorySessionStore::new());
        let couple = uuid::Uuid::new_v4();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(
                    async move { store.create_if_absent(couple, pool(&["a", "b"]), now()).await },
                )
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "every caller must see the same session");
    }

    #[tokio::test]
    async fn couples_do_not_share_sessions() {
        let store = MemorySessionStore::new();
        let a = store
            .create_if_absent(uuid::Uuid::new_v4(), pool(&["a"]), now())
            .await
            .unwrap();
        let b = store
            .create_if_absent(uuid::Uuid::new_v4(), pool(&["a"]), now())
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    // -- try_draw -----------------------------------------------------------

    #[tokio::test]
    async fn try_draw_commits_and_returns_updated_session() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let session = store
            .create_if_absent(couple, pool(&["a", "b"]), now())
            .await
            .unwrap();
        let who = uuid::Uuid::new_v4();

        let updated = store
            .try_draw(session.id, SessionStatus::Active, "a", who, now())
            .await
            .unwrap()
            .expect("draw should commit");

        assert_eq!(updated.current.as_deref(), Some("a"));
        assert_eq!(updated.log.len(), 1);
        assert!(!updated.pool.contains(&"a".to_string()));
    }

    #[tokio::test]
    async fn try_draw_rejects_the_second_taker() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let session = store
            .create_if_absent(couple, pool(&["a", "b"]), now())
            .await
            .unwrap();

        let first = store
            .try_draw(session.id, SessionStatus::Active, "a", uuid::Uuid::new_v4(), now())
            .await
            .unwrap();
        let second = store
            .try_draw(session.id, SessionStatus::Active, "a", uuid::Uuid::new_v4(), now())
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none(), "the card was already taken");

        let state = store.get_active(couple).await.unwrap().unwrap();
        assert_eq!(state.log.len(), 1, "exactly one draw may commit");
    }

    #[tokio::test]
    async fn concurrent_draws_of_the_same_card_have_one_winner() {
        let store = Arc::new(MemorySessionStore::new());
        let couple = uuid::Uuid::new_v4();
        let session = store
            .create_if_absent(couple, pool(&["a", "b", "c"]), now())
            .await
            .unwrap();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = session.id;
                tokio::spawn(async move {
                    store
                        .try_draw(id, SessionStatus::Active, "b", uuid::Uuid::new_v4(), now())
                        .await
                })
            })
            .collect();

        let results = futures::future::join_all(attempts).await;
        let winners = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(Some(_)))))
            .count();

        assert_eq!(winners, 1, "exactly one concurrent draw may win");

        let state = store.get_active(couple).await.unwrap().unwrap();
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.pool.len(), 2);
    }

    #[tokio::test]
    async fn try_draw_against_a_replaced_session_is_rejected() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let stale = store
            .create_if_absent(couple, pool(&["a"]), now())
            .await
            .unwrap();

        store.replace(couple, pool(&["a"]), now()).await.unwrap();

        let result = store
            .try_draw(stale.id, SessionStatus::Active, "a", uuid::Uuid::new_v4(), now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    // -- discard ------------------------------------------------------------

    #[tokio::test]
    async fn discard_clears_current_and_is_idempotent() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let session = store
            .create_if_absent(couple, pool(&["a"]), now())
            .await
            .unwrap();
        store
            .try_draw(session.id, SessionStatus::Active, "a", uuid::Uuid::new_v4(), now())
            .await
            .unwrap();

        let once = store.discard(session.id, now()).await.unwrap();
        assert!(once.current.is_none());
        assert_eq!(once.log.len(), 1, "discard keeps the log");

        let twice = store.discard(session.id, now()).await.unwrap();
        assert!(twice.current.is_none());
    }

    #[tokio::test]
    async fn discard_unknown_session_is_not_found() {
        let store = MemorySessionStore::new();
        let missing = uuid::Uuid::new_v4();
        let err = store.discard(missing, now()).await.unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound { id } if id == missing));
    }

    // -- complete -----------------------------------------------------------

    #[tokio::test]
    async fn complete_requires_an_exhausted_active_session() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let session = store
            .create_if_absent(couple, pool(&["a"]), now())
            .await
            .unwrap();

        // Pool still holds a card: rejected.
        assert!(store.complete(session.id, now()).await.unwrap().is_none());

        store
            .try_draw(session.id, SessionStatus::Active, "a", uuid::Uuid::new_v4(), now())
            .await
            .unwrap();

        let completed = store
            .complete(session.id, now())
            .await
            .unwrap()
            .expect("exhausted session should complete");
        assert_eq!(completed.status, SessionStatus::Completed);
        assert!(completed.current.is_none());

        // Second completion is a rejected condition, not an error.
        assert!(store.complete(session.id, now()).await.unwrap().is_none());

        // No active session remains; the next create starts fresh.
        assert!(store.get_active(couple).await.unwrap().is_none());
        let fresh = store
            .create_if_absent(couple, pool(&["a"]), now())
            .await
            .unwrap();
        assert_ne!(fresh.id, session.id);
    }

    // -- replace ------------------------------------------------------------

    #[tokio::test]
    async fn replace_supersedes_with_a_fresh_full_session() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let old = store
            .create_if_absent(couple, pool(&["a", "b"]), now())
            .await
            .unwrap();
        store
            .try_draw(old.id, SessionStatus::Active, "a", uuid::Uuid::new_v4(), now())
            .await
            .unwrap();

        let fresh = store
            .replace(couple, pool(&["a", "b"]), now())
            .await
            .unwrap();

        assert_ne!(fresh.id, old.id);
        assert_eq!(fresh.pool.len(), 2);
        assert!(fresh.log.is_empty());
        assert!(fresh.current.is_none());
        assert_eq!(store.get_active(couple).await.unwrap().unwrap().id, fresh.id);
    }

    #[tokio::test]
    async fn replace_works_with_no_prior_session() {
        let store = MemorySessionStore::new();
        let couple = uuid::Uuid::new_v4();
        let fresh = store.replace(couple, pool(&["a"]), now()).await.unwrap();
        assert_eq!(store.get_active(couple).await.unwrap().unwrap().id, fresh.id);
    }
}
