mod model;
mod rate_limit;
mod routes;
mod selector;
mod services;
mod state;
mod store;

use std::sync::Arc;

use crate::store::{EndpointStore, MemoryStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let store: Arc<dyn EndpointStore> = Arc::new(MemoryStore::new());
    let state = state::AppState::new(store);

    // Optional seed configuration, loaded through the same all-or-nothing
    // validation as a live import. A bad seed aborts startup.
    if let Ok(path) = std::env::var("PROXYBOARD_SEED") {
        let raw = std::fs::read_to_string(&path).expect("seed configuration unreadable");
        let value: serde_json::Value =
            serde_json::from_str(&raw).expect("seed configuration is not valid JSON");
        let count = services::endpoint::import_config(&state, value)
            .await
            .expect("seed configuration rejected");
        tracing::info!(%path, count, "seed configuration loaded");
    }

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "proxyboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
