//! HTTP routes and shared state.

use crate::ws::ws_handler;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use pitlane_core::{CancellationToken, SimEnv};
use serde_json::json;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// State shared by every connection.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: SimEnv,
    pub sink_capacity: usize,
    /// Cancelled when the server shuts down; parent of every run's token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(env: SimEnv, sink_capacity: usize, shutdown: CancellationToken) -> Self {
        Self {
            env,
            sink_capacity,
            shutdown,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
