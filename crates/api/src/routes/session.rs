//! Handlers for the `/session` resource: the couple's shared deck.
//!
//! Every endpoint requires participant identity headers (see
//! [`Participant`]). Conflict-class outcomes (someone else took the card,
//! deck exhausted, stale catalog) map to 409 with distinct error codes so
//! clients can offer the right recovery action.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use pairdeck_core::card::Card;
use pairdeck_core::session::DrawSession;

use crate::error::AppResult;
use crate::middleware::Participant;
use crate::response::DataResponse;
use crate::state::AppState;

/// Payload for a successful draw.
#[derive(Debug, Serialize)]
pub struct DrawResponse {
    pub session: DrawSession,
    pub card: Card,
}

/// GET /api/v1/session
///
/// The couple's active session, lazily created with the full deck.
pub async fn get_session(
    who: Participant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DrawSession>>> {
    let session = state.coordinator.get_or_create_session(who.couple_id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/session/draw
///
/// Draw one card. 409 `DRAW_CONFLICT` when a concurrent draw won the same
/// card, 409 `DECK_EXHAUSTED` when nothing is left to draw.
pub async fn draw(
    who: Participant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DrawResponse>>> {
    let outcome = state
        .coordinator
        .draw(who.couple_id, who.participant_id)
        .await?;
    Ok(Json(DataResponse {
        data: DrawResponse {
            session: outcome.session,
            card: outcome.card,
        },
    }))
}

/// POST /api/v1/session/discard
///
/// Put the revealed card face-down. Idempotent.
pub async fn discard(
    who: Participant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DrawSession>>> {
    let session = state
        .coordinator
        .discard(who.couple_id, who.participant_id)
        .await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/session/reset
///
/// Replace the session with a fresh full deck. Both clients' reveal state
/// is invalidated by the pushed cleared event.
pub async fn reset(
    who: Participant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DrawSession>>> {
    let session = state
        .coordinator
        .reset(who.couple_id, who.participant_id)
        .await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/session/complete
///
/// Explicitly close an exhausted session. 409 `DECK_NOT_EXHAUSTED` while
/// cards remain undrawn.
pub async fn complete(
    who: Participant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DrawSession>>> {
    let session = state
        .coordinator
        .complete(who.couple_id, who.participant_id)
        .await?;
    Ok(Json(DataResponse { data: session }))
}

/// Routes mounted at `/session`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/draw", post(draw))
        .route("/discard", post(discard))
        .route("/reset", post(reset))
        .route("/complete", post(complete))
}
