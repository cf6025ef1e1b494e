//! Axum router construction.
//!
//! Assembles the WebSocket sync endpoint and the REST routes into a
//! single [`Router`] with CORS middleware enabled for browser clients
//! served from another origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /ws` -- WebSocket sync connection
/// - `GET /health` -- liveness
/// - `GET /todos`, `POST /todos` -- list and create
/// - `PATCH /todos/{id}`, `DELETE /todos/{id}` -- update and delete
///
/// CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_sync))
        // REST API
        .route("/health", get(handlers::health))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/{id}",
            patch(handlers::update_todo).delete(handlers::delete_todo),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
