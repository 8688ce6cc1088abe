//! WebSocket infrastructure: the presence relay, the HTTP upgrade handler,
//! the bus-to-socket forwarder, and heartbeat monitoring.

mod forwarder;
mod handler;
mod heartbeat;
pub mod relay;

pub use forwarder::EventForwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use relay::PresenceRelay;
