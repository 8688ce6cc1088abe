use std::sync::Arc;

use pairdeck_core::card::Catalog;

use crate::config::ServerConfig;
use crate::engine::DrawCoordinator;
use crate::ws::PresenceRelay;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The card catalog, loaded once at startup.
    pub catalog: Arc<Catalog>,
    /// The draw coordinator; every session mutation goes through it.
    pub coordinator: Arc<DrawCoordinator>,
    /// WebSocket connection registry for the couple's two clients.
    pub relay: Arc<PresenceRelay>,
}
