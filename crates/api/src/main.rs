use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pairdeck_api::config::ServerConfig;
use pairdeck_api::engine::DrawCoordinator;
use pairdeck_api::middleware::identity::{COUPLE_HEADER, PARTICIPANT_HEADER};
use pairdeck_api::{routes, state, ws};
use pairdeck_core::card::Catalog;
use pairdeck_db::{MemorySessionStore, PgSessionStore, SessionStore};
use pairdeck_events::EventBus;

use state::AppState;

/// Deck shipped with the binary, used when `CATALOG_PATH` is unset.
const BUILTIN_DECK: &str = include_str!("../assets/deck.json");

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pairdeck_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Catalog ---
    let catalog = Arc::new(load_catalog(&config));
    tracing::info!(cards = catalog.len(), "Card catalog loaded");

    // --- Session store ---
    let store = build_store(&config).await;

    // --- Presence relay ---
    let relay = Arc::new(ws::PresenceRelay::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&relay));

    // --- Event bus + forwarder ---
    let event_bus = Arc::new(EventBus::default());
    let forwarder = ws::EventForwarder::new(Arc::clone(&relay));
    let forwarder_handle = tokio::spawn(forwarder.run(event_bus.subscribe()));
    tracing::info!("Event forwarder started");

    // --- Draw coordinator ---
    let coordinator = Arc::new(DrawCoordinator::new(
        store,
        Arc::clone(&catalog),
        Arc::clone(&event_bus),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        catalog,
        coordinator,
        relay: Arc::clone(&relay),
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the event bus sender to close the broadcast channel, which
    // signals the forwarder to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        forwarder_handle,
    )
    .await;
    tracing::info!("Event forwarder shut down");

    let ws_count = relay.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    relay.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Load the card catalog from `CATALOG_PATH`, or fall back to the deck
/// shipped with the binary.
///
/// A malformed deck is a fatal startup error; the server refuses to boot
/// rather than run with a partial catalog.
fn load_catalog(config: &ServerConfig) -> Catalog {
    match &config.catalog_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("Failed to read catalog at '{path}': {e}"));
            Catalog::from_json_str(&raw)
                .unwrap_or_else(|e| panic!("Invalid catalog at '{path}': {e}"))
        }
        None => Catalog::from_json_str(BUILTIN_DECK).expect("Built-in deck must be valid"),
    }
}

/// Select the session store: Postgres when `DATABASE_URL` is set, the
/// in-memory store otherwise.
async fn build_store(config: &ServerConfig) -> Arc<dyn SessionStore> {
    match &config.database_url {
        Some(database_url) => {
            let pool = pairdeck_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            pairdeck_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            pairdeck_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgSessionStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory session store");
            Arc::new(MemorySessionStore::new())
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(PARTICIPANT_HEADER),
            HeaderName::from_static(COUPLE_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
