//! Bus-to-socket forwarder.
//!
//! Subscribes to the event bus and mirrors each committed session
//! transition to the couple's other participant over the relay. Delivery
//! is not transactional with the store mutation: a disconnected partner
//! misses the push and catches up from the durable session on rejoin.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use pairdeck_core::sync::SyncMessage;
use pairdeck_events::SessionEvent;

use crate::ws::PresenceRelay;

/// Forwards [`SessionEvent`]s to WebSocket clients.
pub struct EventForwarder {
    relay: Arc<PresenceRelay>,
}

impl EventForwarder {
    pub fn new(relay: Arc<PresenceRelay>) -> Self {
        Self { relay }
    }

    /// Run the forwarding loop.
    ///
    /// Exits when the channel is closed (i.e. the
    /// [`EventBus`](pairdeck_events::EventBus) is dropped at shutdown).
    pub async fn run(self, mut receiver: broadcast::Receiver<SessionEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.forward(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, forwarder shutting down");
                    break;
                }
            }
        }
    }

    /// Mirror one event to the originator's partner.
    async fn forward(&self, event: SessionEvent) {
        let couple_id = event.couple_id();
        let origin = event.origin();

        let message = match event {
            SessionEvent::Revealed { card, session, .. } => {
                SyncMessage::SessionRevealed { card, session }
            }
            SessionEvent::Cleared { session, .. } => SyncMessage::SessionCleared { session },
        };

        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize session event");
                return;
            }
        };

        let delivered = self
            .relay
            .notify_couple(couple_id, origin, Message::Text(text.into()))
            .await;
        tracing::debug!(%couple_id, delivered, "Session event forwarded");
    }
}
