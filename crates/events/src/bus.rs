//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The draw coordinator publishes a [`SessionEvent`] after every committed
//! transition; the presence relay's forwarder subscribes and mirrors the
//! outcome to the partner's WebSocket. The bus is shared via
//! `Arc<EventBus>` across the application.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use pairdeck_core::card::Card;
use pairdeck_core::session::DrawSession;
use pairdeck_core::types::{CoupleId, ParticipantId};

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// A committed session transition, as seen by subscribers.
///
/// `origin` is the participant whose request caused the transition; the
/// relay uses it to skip echoing the event back to the requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A draw committed: `card` is now revealed to the couple.
    Revealed {
        couple_id: CoupleId,
        origin: Option<ParticipantId>,
        card: Card,
        session: DrawSession,
    },

    /// The revealed card went away (discard, reset, or completion).
    Cleared {
        couple_id: CoupleId,
        origin: Option<ParticipantId>,
        session: DrawSession,
    },
}

impl SessionEvent {
    pub fn revealed(
        origin: Option<ParticipantId>,
        card: Card,
        session: DrawSession,
    ) -> Self {
        Self::Revealed {
            couple_id: session.couple_id,
            origin,
            card,
            session,
        }
    }

    pub fn cleared(origin: Option<ParticipantId>, session: DrawSession) -> Self {
        Self::Cleared {
            couple_id: session.couple_id,
            origin,
            session,
        }
    }

    /// The couple whose session transitioned.
    pub fn couple_id(&self) -> CoupleId {
        match self {
            Self::Revealed { couple_id, .. } | Self::Cleared { couple_id, .. } => *couple_id,
        }
    }

    /// The participant that triggered the transition, if known.
    pub fn origin(&self) -> Option<ParticipantId> {
        match self {
            Self::Revealed { origin, .. } | Self::Cleared { origin, .. } => *origin,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`SessionEvent`]. Delivery is
/// best-effort: slow receivers observe `RecvError::Lagged`, and with zero
/// subscribers events are silently dropped.
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SessionEvent) {
        // The SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
