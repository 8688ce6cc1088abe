use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use pairdeck_core::sync::SyncMessage;

use crate::middleware::Participant;
use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Identity comes from the request headers; after the upgrade the
/// connection is registered with the relay and managed by two tasks
/// (sender + receiver).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    who: Participant,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, who, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the participant with the relay.
///   2. Spawns a sender task that forwards relay messages to the sink.
///   3. Processes inbound [`SyncMessage`]s on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, who: Participant, state: AppState) {
    let conn_id = uuid::Uuid::new_v4();
    tracing::info!(
        conn_id = %conn_id,
        participant_id = %who.participant_id,
        couple_id = %who.couple_id,
        "WebSocket connected"
    );

    let mut rx = state
        .relay
        .register(who.participant_id, who.couple_id, conn_id)
        .await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward relay messages to the WebSocket sink.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<SyncMessage>(&text) {
                Ok(msg) => dispatch(&state, who, msg).await,
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Unparseable sync message");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up; unregister is conn-id guarded so a reconnect that already
    // replaced this registration is left alone.
    state.relay.unregister(who.participant_id, conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, participant_id = %who.participant_id, "WebSocket disconnected");
}

/// Handle one client sync message.
///
/// The `*.notify` messages are mirror requests: the durable session is
/// re-read and its state pushed to the partner. Client payloads never carry
/// deck state, so a stale or tampered client cannot corrupt anyone's view.
async fn dispatch(state: &AppState, who: Participant, msg: SyncMessage) {
    match msg {
        // Presence is already established by the upgrade; join answers
        // with a snapshot so a reconnecting client catches up on whatever
        // pushes it missed while offline.
        SyncMessage::Join => {
            let session = match state.coordinator.get_or_create_session(who.couple_id).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(couple_id = %who.couple_id, error = %e, "Join snapshot failed");
                    return;
                }
            };
            let snapshot = SyncMessage::SessionState { session };
            send_to_self(state, who, &snapshot).await;
        }

        SyncMessage::DrawNotify => {
            let Some(session) = read_session(state, who).await else {
                return;
            };
            // Mirror whatever is durably revealed right now.
            let mirrored = match session.current.as_deref().and_then(|id| state.catalog.resolve(id))
            {
                Some(card) => SyncMessage::SessionRevealed {
                    card: card.clone(),
                    session,
                },
                None => SyncMessage::SessionState { session },
            };
            push_to_partner(state, who, &mirrored).await;
        }

        SyncMessage::DiscardNotify => {
            let Some(session) = read_session(state, who).await else {
                return;
            };
            let cleared = SyncMessage::SessionCleared { session };
            push_to_partner(state, who, &cleared).await;
        }

        // Server-to-client messages arriving inbound are a client bug.
        other => {
            tracing::debug!(
                participant_id = %who.participant_id,
                message = ?other,
                "Ignoring server-bound message of server-to-client type"
            );
        }
    }
}

async fn read_session(
    state: &AppState,
    who: Participant,
) -> Option<pairdeck_core::session::DrawSession> {
    match state.coordinator.get_or_create_session(who.couple_id).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(couple_id = %who.couple_id, error = %e, "Session read failed");
            None
        }
    }
}

async fn send_to_self(state: &AppState, who: Participant, msg: &SyncMessage) {
    match serde_json::to_string(msg) {
        Ok(text) => {
            state
                .relay
                .send_to(who.participant_id, Message::Text(text.into()))
                .await;
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize sync message"),
    }
}

async fn push_to_partner(state: &AppState, who: Participant, msg: &SyncMessage) {
    match serde_json::to_string(msg) {
        Ok(text) => {
            state
                .relay
                .notify_couple(
                    who.couple_id,
                    Some(who.participant_id),
                    Message::Text(text.into()),
                )
                .await;
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize sync message"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
