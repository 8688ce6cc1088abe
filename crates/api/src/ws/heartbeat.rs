use std::sync::Arc;
use std::time::Duration;

use crate::ws::relay::PresenceRelay;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that sends periodic Ping frames to all connected
/// WebSocket clients.
///
/// The task runs until aborted; the returned `JoinHandle` is kept by the
/// entrypoint and aborted during graceful shutdown.
pub fn start_heartbeat(relay: Arc<PresenceRelay>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = relay.connection_count().await;
            tracing::debug!(count, "WebSocket heartbeat ping");
            relay.ping_all().await;
        }
    })
}
