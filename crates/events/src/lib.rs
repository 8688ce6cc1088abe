//! In-process event plumbing between the draw coordinator and the
//! presence relay.

pub mod bus;

pub use bus::{EventBus, SessionEvent};
