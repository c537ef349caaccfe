//! Room listing route.

use axum::Json;
use axum::extract::State;

use crate::services::registry::RoomSummary;
use crate::state::AppState;

/// `GET /api/rooms`: live rooms with member and connection counts.
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.rooms.list().await)
}
