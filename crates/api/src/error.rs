use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::engine::DrawError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`DrawError`] for engine outcomes and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An engine-level error from the draw coordinator.
    #[error(transparent)]
    Draw(#[from] DrawError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Draw(draw) => match draw {
                DrawError::DeckExhausted => {
                    (StatusCode::CONFLICT, "DECK_EXHAUSTED", draw.to_string())
                }
                DrawError::DrawConflict => {
                    (StatusCode::CONFLICT, "DRAW_CONFLICT", draw.to_string())
                }
                DrawError::StaleCatalog { .. } => {
                    (StatusCode::CONFLICT, "STALE_CATALOG", draw.to_string())
                }
                DrawError::DeckNotExhausted => {
                    (StatusCode::CONFLICT, "DECK_NOT_EXHAUSTED", draw.to_string())
                }
                DrawError::SessionNotFound => {
                    (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", draw.to_string())
                }
                DrawError::Storage(err) => {
                    tracing::error!(error = %err, "Session store error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_UNAVAILABLE",
                        "The session store is unavailable".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
