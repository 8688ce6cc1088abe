//! Row models for the session store.

pub mod session;

pub use session::SessionRow;
