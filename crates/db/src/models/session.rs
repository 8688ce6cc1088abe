//! Draw session row model.

use sqlx::types::Json;
use sqlx::FromRow;

use pairdeck_core::session::{DrawEntry, DrawSession, SessionStatus};
use pairdeck_core::types::{CoupleId, SessionId, Timestamp};

/// A row from the `draw_sessions` table.
///
/// `pool` is a `TEXT[]`, `log` is a `JSONB` array of draw entries. The
/// `status` column is constrained by `ck_draw_sessions_status`, so the
/// decode through [`SessionStatus`] cannot fail on well-formed data.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: SessionId,
    pub couple_id: CoupleId,
    pub pool: Vec<String>,
    pub log: Json<Vec<DrawEntry>>,
    pub current_card: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SessionRow> for DrawSession {
    fn from(row: SessionRow) -> Self {
        DrawSession {
            id: row.id,
            couple_id: row.couple_id,
            pool: row.pool,
            log: row.log.0,
            current: row.current_card,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_domain_session() {
        let drawn_at = chrono::Utc::now();
        let drawn_by = uuid::Uuid::new_v4();
        let row = SessionRow {
            id: uuid::Uuid::new_v4(),
            couple_id: uuid::Uuid::new_v4(),
            pool: vec!["b".to_string(), "c".to_string()],
            log: Json(vec![DrawEntry {
                card_id: "a".to_string(),
                drawn_by,
                drawn_at,
            }]),
            current_card: Some("a".to_string()),
            status: SessionStatus::Active,
            created_at: drawn_at,
            updated_at: drawn_at,
        };

        let session: DrawSession = row.into();
        assert_eq!(session.pool, vec!["b", "c"]);
        assert_eq!(session.log.len(), 1);
        assert_eq!(session.log[0].drawn_by, drawn_by);
        assert_eq!(session.current.as_deref(), Some("a"));
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[test]
    fn status_try_from_rejects_unknown_strings() {
        assert!(SessionStatus::try_from("active".to_string()).is_ok());
        assert!(SessionStatus::try_from("paused".to_string()).is_err());
    }
}
