// Router construction and the server entry point.

use std::net::SocketAddr;

use axum::{routing::get, Json, Router};

use crate::server::state::AppState;
use anyhow::{Context, Result};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "ok": true })) }),
        )
        .route("/ws", get(crate::server::ws::ws_handler))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state.clone());

    let display_addr = if addr.ip().to_string() == "127.0.0.1" {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    };
    tracing::info!(%display_addr, "game-nights server running");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", display_addr))?;
    let result = axum::serve(listener, app).await;

    // registry-wide teardown: every scheduled timer dies with the server
    state.timers.shutdown();
    result.map_err(Into::into)
}
