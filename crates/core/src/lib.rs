//! Shared domain types and pure logic for the pairdeck draw engine.
//!
//! This crate has no internal dependencies so the store, event, and API
//! layers all speak the same vocabulary:
//!
//! - [`Card`] / [`Catalog`] — the immutable deck content.
//! - [`DrawSession`] — one couple's shared deck state and its transitions.
//! - [`SyncMessage`] — the realtime wire protocol.

pub mod card;
pub mod error;
pub mod session;
pub mod sync;
pub mod types;

pub use card::{Card, Catalog};
pub use error::CatalogError;
pub use session::{DrawEntry, DrawSession, SessionStatus};
pub use sync::SyncMessage;
