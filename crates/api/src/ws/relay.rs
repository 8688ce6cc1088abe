//! The presence relay: a live mapping from participant identity to an open
//! WebSocket channel, scoped fan-out to the participant's couple, and the
//! connection-management surface used by heartbeat and shutdown.
//!
//! Delivery is best-effort by design: a disconnected partner simply misses
//! the push and catches up from the durable session on its next join.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use pairdeck_core::types::{CoupleId, ParticipantId};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type RelaySender = mpsc::UnboundedSender<Message>;

/// One participant's live connection.
struct Registration {
    couple_id: CoupleId,
    /// Distinguishes this socket from a later reconnect by the same
    /// participant, so a stale disconnect cannot evict a fresh channel.
    conn_id: uuid::Uuid,
    sender: RelaySender,
}

/// Registry of all connected participants.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. At most one channel per participant:
/// `register` is last-write-wins, a reconnect supersedes the stale channel.
pub struct PresenceRelay {
    connections: RwLock<HashMap<ParticipantId, Registration>>,
}

impl PresenceRelay {
    /// Create a new, empty relay.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a participant's connection, replacing any prior channel for
    /// the same participant.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn register(
        &self,
        participant_id: ParticipantId,
        couple_id: CoupleId,
        conn_id: uuid::Uuid,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let registration = Registration {
            couple_id,
            conn_id,
            sender: tx,
        };
        let replaced = self
            .connections
            .write()
            .await
            .insert(participant_id, registration);
        if replaced.is_some() {
            tracing::debug!(participant_id = %participant_id, "reconnect superseded prior channel");
        }
        rx
    }

    /// Remove a participant's registration, but only if it still belongs to
    /// `conn_id`. A disconnect racing with a reconnect is a no-op.
    pub async fn unregister(&self, participant_id: ParticipantId, conn_id: uuid::Uuid) {
        let mut connections = self.connections.write().await;
        if connections
            .get(&participant_id)
            .is_some_and(|r| r.conn_id == conn_id)
        {
            connections.remove(&participant_id);
        }
    }

    /// Push a message to one participant's channel.
    ///
    /// Returns `false` if the participant is not connected or the channel
    /// is already closed.
    pub async fn send_to(&self, participant_id: ParticipantId, message: Message) -> bool {
        let connections = self.connections.read().await;
        match connections.get(&participant_id) {
            Some(registration) => registration.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Deliver a message to every connected participant of `couple_id`,
    /// skipping `except` (the originator, which already holds the result).
    ///
    /// Best-effort: closed or missing channels are skipped and logged,
    /// never escalated. Returns the number of channels the message was
    /// handed to.
    pub async fn notify_couple(
        &self,
        couple_id: CoupleId,
        except: Option<ParticipantId>,
        message: Message,
    ) -> usize {
        let connections = self.connections.read().await;
        let mut count = 0;
        for (participant_id, registration) in connections.iter() {
            if registration.couple_id != couple_id {
                continue;
            }
            if Some(*participant_id) == except {
                continue;
            }
            if registration.sender.send(message.clone()).is_ok() {
                count += 1;
            } else {
                tracing::debug!(
                    participant_id = %participant_id,
                    "partner channel closed, dropping event"
                );
            }
        }
        count
    }

    /// Return the current number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let connections = self.connections.read().await;
        for registration in connections.values() {
            let _ = registration.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut connections = self.connections.write().await;
        let count = connections.len();
        for registration in connections.values() {
            let _ = registration.sender.send(Message::Close(None));
        }
        connections.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for PresenceRelay {
    fn default() -> Self {
        Self::new()
    }
}
