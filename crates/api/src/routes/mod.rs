pub mod health;
pub mod session;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                      WebSocket upgrade (presence + sync)
///
/// /session                 get-or-create the caller's session
/// /session/draw            draw one card
/// /session/discard         put the revealed card face-down
/// /session/reset           replace the session with a fresh full deck
/// /session/complete        close an exhausted session
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/session", session::router())
}
