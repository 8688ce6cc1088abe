use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use pairdeck_api::config::ServerConfig;
use pairdeck_api::engine::DrawCoordinator;
use pairdeck_api::middleware::identity::{COUPLE_HEADER, PARTICIPANT_HEADER};
use pairdeck_api::middleware::Participant;
use pairdeck_api::routes;
use pairdeck_api::state::AppState;
use pairdeck_api::ws::{EventForwarder, PresenceRelay};
use pairdeck_core::card::{Card, Catalog};
use pairdeck_db::MemorySessionStore;
use pairdeck_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        catalog_path: None,
        database_url: None,
    }
}

/// Build a catalog of uniform level-1 cards from the given ids.
pub fn test_catalog(ids: &[&str]) -> Catalog {
    let cards = ids
        .iter()
        .map(|id| Card {
            id: id.to_string(),
            level: 1,
            category: "connect".to_string(),
            prompt: format!("Prompt for {id}"),
            followups: vec![],
            flags: BTreeSet::new(),
        })
        .collect();
    Catalog::from_cards(cards).expect("test catalog must be valid")
}

/// A fully wired application over the in-memory store, with handles to the
/// relay and bus for assertions.
pub struct TestApp {
    pub router: Router,
    pub relay: Arc<PresenceRelay>,
    pub bus: Arc<EventBus>,
}

/// Build the full application router with all middleware layers, backed by
/// the in-memory session store and a catalog seeded from `deck`.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. The event forwarder is spawned
/// exactly as in production.
pub fn build_test_app(deck: &[&str]) -> TestApp {
    let config = test_config();
    let catalog = Arc::new(test_catalog(deck));
    let relay = Arc::new(PresenceRelay::new());
    let bus = Arc::new(EventBus::default());

    let forwarder = EventForwarder::new(Arc::clone(&relay));
    tokio::spawn(forwarder.run(bus.subscribe()));

    let coordinator = Arc::new(DrawCoordinator::new(
        Arc::new(MemorySessionStore::new()),
        Arc::clone(&catalog),
        Arc::clone(&bus),
    ));

    let state = AppState {
        config: Arc::new(config),
        catalog,
        coordinator,
        relay: Arc::clone(&relay),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(PARTICIPANT_HEADER),
            HeaderName::from_static(COUPLE_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp { router, relay, bus }
}

/// Two participants sharing one couple.
pub fn test_couple() -> (Participant, Participant) {
    let couple_id = uuid::Uuid::new_v4();
    (
        Participant {
            participant_id: uuid::Uuid::new_v4(),
            couple_id,
        },
        Participant {
            participant_id: uuid::Uuid::new_v4(),
            couple_id,
        },
    )
}

/// Send a request with the participant's identity headers attached.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    who: Participant,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(PARTICIPANT_HEADER, who.participant_id.to_string())
        .header(COUPLE_HEADER, who.couple_id.to_string())
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str, who: Participant) -> Response<Body> {
    send(router, Method::GET, uri, who).await
}

pub async fn post(router: &Router, uri: &str, who: Participant) -> Response<Body> {
    send(router, Method::POST, uri, who).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
