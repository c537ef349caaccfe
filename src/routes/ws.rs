//! WebSocket handler: one connection to one room.
//!
//! DESIGN
//! ======
//! The upgrade is only accepted for a known cookie user. The connection then
//! enters a `select!` loop over three sources:
//! - inbound client text → registry dispatch under the room lock
//! - queued events (`seeked`) → forward to client
//! - latest snapshot (`sync`) → forward to client
//!
//! The loop is `biased` with events ahead of snapshots, so a `seeked` that
//! was queued in the same dispatch as a resync always reaches the client
//! first. Snapshots that pile up while the socket is slow collapse to the
//! newest one.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `connected` with `clientId`
//! 2. Join the room → every member gets a `sync`
//! 3. Client sends action envelopes → dispatch → every member gets a `sync`
//! 4. Close → leave the room → remaining members get a `sync`

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::ServerFrame;
use crate::routes::auth::CookieUser;
use crate::services::dispatch::DispatchReport;
use crate::services::room::outbox;
use crate::services::users::User;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

/// `GET /api/rooms/{room_id}/ws`
pub async fn handle_ws(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    CookieUser(user): CookieUser,
    ws: WebSocketUpgrade,
) -> Response {
    if room_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "room id required").into_response();
    }

    ws.on_upgrade(move |socket| run_ws(socket, state, room_id, user))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, room_id: String, user: User) {
    let client_id = Uuid::new_v4();
    let user_id = user.id;
    let (tx, mut inbox) = outbox(state.config.outbox_event_capacity);

    let welcome = ServerFrame::Connected { client_id, room_id: room_id.clone(), user: user.clone() };
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    state.rooms.join(&room_id, user, client_id, tx).await;
    info!(%client_id, %user_id, %room_id, "ws: client connected");

    loop {
        tokio::select! {
            biased;
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, &room_id, client_id, user_id, text.as_str()).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = inbox.events.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
            changed = inbox.sync.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = inbox.sync.borrow_and_update().clone();
                if let Some(frame) = latest {
                    if send_frame(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    state.rooms.leave(&room_id, client_id).await;
    info!(%client_id, %user_id, %room_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Run one inbound text frame through the room. Profile edits are persisted
/// under the room lock.
///
/// Kept apart from the socket loop so tests can drive it directly.
async fn process_inbound_text(
    state: &AppState,
    room_id: &str,
    client_id: Uuid,
    user_id: Uuid,
    text: &str,
) -> Option<DispatchReport> {
    let Some(report) = state.rooms.dispatch_persisting(room_id, user_id, text, state.users.as_ref()).await else {
        warn!(%client_id, %room_id, "ws: frame for room that no longer exists");
        return None;
    };

    debug!(%client_id, %room_id, revision = report.revision, "ws: frame dispatched");
    Some(report)
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(kind = frame.kind(), error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    let result = socket.send(Message::Text(json.into())).await.map_err(|_| ());
    if result.is_ok() {
        debug!(kind = frame.kind(), "ws: send frame");
    }
    result
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
