//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the guest auth endpoint, the room listing, the per-room websocket
//! and a health check under one Axum router.

pub mod auth;
pub mod rooms;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/user/auth", post(auth::auth))
        .route("/api/rooms", get(rooms::list_rooms))
        .route("/api/rooms/{room_id}/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
