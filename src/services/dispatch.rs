//! Action dispatcher: decode, apply to the room, resync.
//!
//! DESIGN
//! ======
//! `dispatch` is the only code path that mutates a room on behalf of a
//! client. It runs while the caller holds the room lock and always ends
//! with exactly one `broadcast_sync`, whether the action applied, was a
//! no-op, or failed to decode. Clients never get an error reply; they
//! infer the outcome from the snapshot.
//!
//! Handlers are one function per action variant. They validate, mutate,
//! and return an `Effect` telling the caller what else changed outside the
//! room (only user profile edits, which are written back to the store).

use tracing::{info, warn};
use uuid::Uuid;

use crate::action::{Action, ActionError, ActionName};
use crate::frame::ErrorCode;
use crate::services::room::Room;
use crate::services::users::User;
use crate::services::video::Video;

// =============================================================================
// TYPES
// =============================================================================

/// Side effects a successful handler reports to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Room state changed; nothing to do outside it.
    Applied,
    /// The acting user's profile changed and should be persisted.
    ProfileChanged(User),
}

/// What happened to one inbound frame.
#[derive(Debug)]
pub struct DispatchReport {
    /// `None` when the envelope itself did not decode.
    pub action: Option<ActionName>,
    pub outcome: Result<Effect, ActionError>,
    /// Room revision after the resync.
    pub revision: u64,
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Handle one raw text frame from `user_id` against `room`.
pub fn dispatch(room: &mut Room, user_id: Uuid, text: &str) -> DispatchReport {
    let decoded = Action::decode(text);
    let action = match &decoded {
        Ok(action) => Some(action.name()),
        Err(ActionError::Decode { name, .. }) => *name,
        Err(_) => None,
    };

    let outcome = decoded.and_then(|action| apply(room, user_id, action));
    log_outcome(room, user_id, action, &outcome);

    room.broadcast_sync();

    DispatchReport { action, outcome, revision: room.revision() }
}

/// Route a decoded action to its handler.
///
/// # Errors
///
/// Returns the handler's `ActionError` when the action had no effect.
pub fn apply(room: &mut Room, user_id: Uuid, action: Action) -> Result<Effect, ActionError> {
    let Some(member) = room.member(user_id) else {
        return Err(ActionError::NotMember(user_id));
    };
    if !member.user.can_update_room() {
        return Err(ActionError::Forbidden(user_id));
    }

    match action {
        Action::UserSetBuffering(buffering) => handle_user_set_buffering(room, user_id, buffering),
        Action::UserSetUsername(name) => handle_user_set_username(room, user_id, name),
        Action::UserSetColor(color) => handle_user_set_color(room, user_id, color),
        Action::PlayerPlay => handle_player_play(room),
        Action::PlayerPause => handle_player_pause(room),
        Action::PlayerSkip => handle_player_skip(room),
        Action::PlayerSeek(time) => handle_player_seek(room, time),
        Action::QueueAdd(video) => handle_queue_add(room, user_id, video),
        Action::QueueRemove(id) => handle_queue_remove(room, id),
        Action::QueueVote(id) => handle_queue_vote(room, user_id, id),
        Action::ChatMessage(text) => handle_chat_message(room, user_id, text),
    }
}

fn log_outcome(room: &Room, user_id: Uuid, action: Option<ActionName>, outcome: &Result<Effect, ActionError>) {
    let room_id = room.id();
    let name = action.map_or("-", ActionName::as_str);
    match outcome {
        Ok(_) => info!(%room_id, %user_id, action = name, "dispatch: applied"),
        Err(e @ ActionError::Decode { .. }) => {
            warn!(%room_id, %user_id, action = name, code = e.error_code(), error = %e, "dispatch: rejected");
        }
        Err(e) => info!(%room_id, %user_id, action = name, code = e.error_code(), error = %e, "dispatch: no-op"),
    }
}

// =============================================================================
// USER HANDLERS
// =============================================================================

fn acting_member(room: &mut Room, user_id: Uuid) -> Result<&mut crate::services::room::Member, ActionError> {
    room.member_mut(user_id).ok_or(ActionError::NotMember(user_id))
}

fn handle_user_set_buffering(room: &mut Room, user_id: Uuid, buffering: bool) -> Result<Effect, ActionError> {
    acting_member(room, user_id)?.buffering = buffering;
    Ok(Effect::Applied)
}

fn handle_user_set_username(room: &mut Room, user_id: Uuid, name: String) -> Result<Effect, ActionError> {
    let member = acting_member(room, user_id)?;
    member.user.name = name;
    Ok(Effect::ProfileChanged(member.user.clone()))
}

fn handle_user_set_color(room: &mut Room, user_id: Uuid, color: String) -> Result<Effect, ActionError> {
    let member = acting_member(room, user_id)?;
    member.user.color = color;
    Ok(Effect::ProfileChanged(member.user.clone()))
}

// =============================================================================
// PLAYER HANDLERS
// =============================================================================

fn handle_player_play(room: &mut Room) -> Result<Effect, ActionError> {
    room.player.restart()?;
    Ok(Effect::Applied)
}

fn handle_player_pause(room: &mut Room) -> Result<Effect, ActionError> {
    room.player.pause()?;
    Ok(Effect::Applied)
}

fn handle_player_skip(room: &mut Room) -> Result<Effect, ActionError> {
    room.skip()?;
    Ok(Effect::Applied)
}

fn handle_player_seek(room: &mut Room, time: u64) -> Result<Effect, ActionError> {
    room.player.seek(time);
    // Goes out ahead of the full resync that follows.
    room.broadcast_seeked(time);
    Ok(Effect::Applied)
}

// =============================================================================
// QUEUE HANDLERS
// =============================================================================

fn handle_queue_add(room: &mut Room, user_id: Uuid, video: Video) -> Result<Effect, ActionError> {
    room.add_video(user_id, video)?;
    Ok(Effect::Applied)
}

fn handle_queue_remove(room: &mut Room, id: Uuid) -> Result<Effect, ActionError> {
    room.queue.remove(id).ok_or(ActionError::NotFound(id))?;
    Ok(Effect::Applied)
}

fn handle_queue_vote(room: &mut Room, user_id: Uuid, id: Uuid) -> Result<Effect, ActionError> {
    room.queue.toggle_vote(user_id, id).ok_or(ActionError::NotFound(id))?;
    Ok(Effect::Applied)
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

fn handle_chat_message(room: &mut Room, user_id: Uuid, text: String) -> Result<Effect, ActionError> {
    let author = acting_member(room, user_id)?.user.clone();
    room.chat.push(&author, text);
    Ok(Effect::Applied)
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
