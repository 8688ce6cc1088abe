//! Participant identity extractor for Axum handlers.
//!
//! Authentication and token issuance live in a separate service; by the
//! time a request reaches this API its identity has been validated and is
//! carried in plain headers. The engine trusts these as given.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use pairdeck_core::types::{CoupleId, ParticipantId};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the authenticated participant id.
pub const PARTICIPANT_HEADER: &str = "x-participant-id";

/// Header carrying the participant's couple id.
pub const COUPLE_HEADER: &str = "x-couple-id";

/// Authenticated participant extracted from request headers.
///
/// Use this as an extractor parameter in any handler that operates on the
/// caller's session:
///
/// ```ignore
/// async fn my_handler(who: Participant) -> AppResult<Json<()>> {
///     tracing::info!(couple_id = %who.couple_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub couple_id: CoupleId,
}

fn header_uuid(parts: &Parts, name: &str) -> Result<uuid::Uuid, AppError> {
    let raw = parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {name} header")))?;

    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("{name} must be a UUID")))
}

impl FromRequestParts<AppState> for Participant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Participant {
            participant_id: header_uuid(parts, PARTICIPANT_HEADER)?,
            couple_id: header_uuid(parts, COUPLE_HEADER)?,
        })
    }
}
