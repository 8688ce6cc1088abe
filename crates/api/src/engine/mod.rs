//! The draw coordinator: turns participant intents into single,
//! well-ordered session transitions.
//!
//! The coordinator owns no state of its own; every guarantee comes from the
//! store's conditional mutation primitives. Each error variant has a
//! distinct, caller-actionable recovery path (see [`DrawError`]), so none
//! of them are collapsed into a generic failure.

mod coordinator;

pub use coordinator::{DrawCoordinator, DrawOutcome};

use pairdeck_core::types::CardId;
use pairdeck_db::StoreError;

/// Failure modes of the draw engine.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    /// The pool is empty; the caller should offer a reset.
    #[error("Every card has been drawn; reset the deck to keep playing")]
    DeckExhausted,

    /// The selected card was taken by a concurrent draw. Recoverable by
    /// drawing again (a fresh random pick against the updated pool), never
    /// by silently substituting a different card server-side.
    #[error("Someone already took that card, try again")]
    DrawConflict,

    /// A pooled card id no longer resolves in the catalog. The session was
    /// seeded against a deck that has since changed; only a reset fixes it.
    #[error("Card '{card_id}' is no longer in the catalog; reset the deck")]
    StaleCatalog { card_id: CardId },

    /// Completion requires every card to have been drawn first.
    #[error("The deck still has undrawn cards")]
    DeckNotExhausted,

    /// The couple has no active session (raced with a reset or completion);
    /// re-fetching the session resolves it.
    #[error("No active session for this couple")]
    SessionNotFound,

    /// The store itself failed; surfaced as-is.
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for DrawError {
    fn from(err: StoreError) -> Self {
        match err {
            // A vanished session id means the caller raced with a reset,
            // which has its own recovery path.
            StoreError::SessionNotFound { .. } => DrawError::SessionNotFound,
            other => DrawError::Storage(other),
        }
    }
}
