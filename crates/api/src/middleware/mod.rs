//! Request middleware: participant identity extraction.

pub mod identity;

pub use identity::Participant;
