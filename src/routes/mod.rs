//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the management REST surface over the endpoint store and the hit
//! recording engine. The actual reverse-proxy forwarding is a separate
//! transport that consumes `record_hit` through the same services; nothing
//! here forwards traffic.

pub mod endpoints;
pub mod hits;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Management API routes.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/endpoints",
            get(endpoints::list_endpoints).post(endpoints::create_endpoint),
        )
        .route(
            "/api/endpoints/{id}",
            get(endpoints::get_endpoint)
                .put(endpoints::update_endpoint)
                .delete(endpoints::delete_endpoint),
        )
        .route("/api/endpoints/{id}/clone", post(endpoints::clone_endpoint))
        .route("/api/endpoints/{id}/hit", post(hits::record_hit))
        .route("/api/endpoints/{id}/stats", get(hits::endpoint_stats))
        .route("/api/endpoints/{id}/probe", post(hits::probe_endpoint))
        .route("/api/config/export", get(endpoints::export_config))
        .route("/api/config/import", post(endpoints::import_config))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
