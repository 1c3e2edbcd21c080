//! Contact Relay Mailer
//!
//! Relays contact-form submissions as email. The SMTP transport is resolved
//! once at startup (disposable Ethereal account or configured host) and
//! injected into the router; each submission is validated, answered
//! immediately and delivered in the background.

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use contact_relay_utils::{AppConfig, RejectionStatus, RelayResult};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

pub mod dispatcher;
pub mod error;
pub mod ethereal;
pub mod handlers;
pub mod message;
pub mod middleware;
pub mod routes;
pub mod transport;
pub mod upload;

use dispatcher::Dispatcher;
use middleware::{cors_layer, request_id_middleware};
use upload::UploadGate;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub upload_gate: Arc<UploadGate>,
    pub rejection_status: RejectionStatus,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, config: &AppConfig) -> Self {
        Self {
            dispatcher,
            upload_gate: Arc::new(UploadGate::new(&config.upload)),
            rejection_status: config.upload.rejection_status,
        }
    }
}

/// Build the router. The transport inside `state` must already be resolved.
pub fn create_app(state: AppState, config: &AppConfig) -> RelayResult<Router> {
    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api", routes::create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.server.cors_origins)?)
                .layer(DefaultBodyLimit::max(config.server.max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )
        .with_state(state);

    // Request logs are development noise; production only logs warnings.
    if config.mode.is_production() {
        return Ok(app);
    }

    Ok(app.layer(
        TraceLayer::new_for_http().on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        ),
    ))
}
