//! Realtime sync protocol between the server and the two clients.
//!
//! Serialized as JSON with an internally-tagged `"type"` discriminator.
//! Client payloads never carry deck state: a `*.notify` message is a mirror
//! request, answered by re-reading the durable session and pushing the
//! result, so a tampered or stale client cannot corrupt the partner's view.

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::session::DrawSession;

/// Messages exchanged over the sync WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SyncMessage {
    /// Client sends: register presence and request a state snapshot.
    /// The couple comes from the authenticated identity, never the payload.
    #[serde(rename = "join")]
    Join,

    /// Client sends: "I drew a card" — the server re-reads the session and
    /// pushes the revealed state to the partner.
    #[serde(rename = "draw.notify")]
    DrawNotify,

    /// Client sends: "I put the card back".
    #[serde(rename = "discard.notify")]
    DiscardNotify,

    /// Server sends: full session snapshot (join reply and catch-up).
    #[serde(rename = "session.state")]
    SessionState { session: DrawSession },

    /// Server sends: a card was revealed, with the resolved card content.
    #[serde(rename = "session.revealed")]
    SessionRevealed { card: Card, session: DrawSession },

    /// Server sends: the revealed card went away (discard, reset, complete).
    #[serde(rename = "session.cleared")]
    SessionCleared { session: DrawSession },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
