//! Room: one watch session with its player, queue, chat and connected members.
//!
//! DESIGN
//! ======
//! A `Room` is plain data plus broadcast. It is never shared directly: the
//! registry wraps each room in its own async mutex, and the dispatcher
//! mutates it only while holding that lock. Broadcasts therefore always see
//! a fully applied state.
//!
//! Members are users; connections are attached to members. A user with two
//! tabs open is one member with two connections, and stays a member until
//! the last of them closes.
//!
//! BACKPRESSURE
//! ============
//! Each connection has an `Outbox`:
//! - snapshots go through a `watch` channel, so an undelivered snapshot is
//!   replaced by the next one instead of queueing behind it
//! - events (`seeked`) go through a small bounded `mpsc` with `try_send`
//!
//! Neither path awaits, so one stalled client cannot hold the room lock.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use uuid::Uuid;

use crate::action::ActionError;
use crate::frame::ServerFrame;
use crate::services::chat::{Chat, ChatMessage};
use crate::services::player::{Player, PlayerSnapshot};
use crate::services::queue::Queue;
use crate::services::users::User;
use crate::services::video::Video;

// =============================================================================
// OUTBOX
// =============================================================================

/// Room-side handle for delivering frames to one connection.
pub struct Outbox {
    sync: watch::Sender<Option<Arc<ServerFrame>>>,
    events: mpsc::Sender<Arc<ServerFrame>>,
}

/// Connection-side ends of an `Outbox`.
pub struct OutboxReceiver {
    pub sync: watch::Receiver<Option<Arc<ServerFrame>>>,
    pub events: mpsc::Receiver<Arc<ServerFrame>>,
}

/// Create a connected outbox pair. `event_capacity` must be non-zero.
#[must_use]
pub fn outbox(event_capacity: usize) -> (Outbox, OutboxReceiver) {
    let (sync_tx, sync_rx) = watch::channel(None);
    let (events_tx, events_rx) = mpsc::channel(event_capacity.max(1));
    (Outbox { sync: sync_tx, events: events_tx }, OutboxReceiver { sync: sync_rx, events: events_rx })
}

impl Outbox {
    /// Replace the pending snapshot.
    fn push_sync(&self, frame: Arc<ServerFrame>) {
        self.sync.send_replace(Some(frame));
    }

    /// Best-effort event delivery. Returns `false` if dropped.
    fn push_event(&self, frame: Arc<ServerFrame>) -> bool {
        self.events.try_send(frame).is_ok()
    }
}

// =============================================================================
// MEMBER
// =============================================================================

pub struct Member {
    pub user: User,
    pub buffering: bool,
    connections: HashMap<Uuid, Outbox>,
}

impl Member {
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Full observable state of a room, as sent in `sync` frames.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    /// Incremented on every broadcast; clients can drop stale snapshots.
    pub revision: u64,
    pub player: PlayerSnapshot,
    pub queue: Vec<Video>,
    pub chat: Vec<ChatMessage>,
    pub members: Vec<MemberSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnapshot {
    #[serde(flatten)]
    pub user: User,
    pub buffering: bool,
    pub connections: usize,
}

// =============================================================================
// ROOM
// =============================================================================

pub struct Room {
    id: String,
    /// In join order.
    members: Vec<Member>,
    revision: u64,
    pub player: Player,
    pub queue: Queue,
    pub chat: Chat,
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<String>, chat_limit: Option<usize>) -> Self {
        Self {
            id: id.into(),
            members: Vec::new(),
            revision: 0,
            player: Player::new(),
            queue: Queue::new(),
            chat: Chat::new(chat_limit),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of `sync` broadcasts so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.members.iter().map(Member::connection_count).sum()
    }

    #[must_use]
    pub fn member(&self, user_id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.user.id == user_id)
    }

    pub fn member_mut(&mut self, user_id: Uuid) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user.id == user_id)
    }

    // -------------------------------------------------------------------------
    // Join / leave
    // -------------------------------------------------------------------------

    /// Attach a connection for `user`. Returns `true` if the user was not a
    /// member yet. An existing member keeps the room's copy of their record.
    pub fn join(&mut self, user: User, client_id: Uuid, outbox: Outbox) -> bool {
        if let Some(member) = self.member_mut(user.id) {
            member.connections.insert(client_id, outbox);
            info!(room_id = %self.id, user_id = %user.id, %client_id, "room: connection attached to member");
            return false;
        }

        info!(room_id = %self.id, user_id = %user.id, %client_id, "room: member joined");
        let mut connections = HashMap::new();
        connections.insert(client_id, outbox);
        self.members.push(Member { user, buffering: false, connections });
        true
    }

    /// Detach a connection. Returns the member's user id if this was their
    /// last connection and they left the room.
    pub fn leave(&mut self, client_id: Uuid) -> Option<Uuid> {
        let index = self
            .members
            .iter()
            .position(|m| m.connections.contains_key(&client_id))?;

        let member = &mut self.members[index];
        member.connections.remove(&client_id);
        if !member.connections.is_empty() {
            info!(room_id = %self.id, user_id = %member.user.id, %client_id, "room: connection detached");
            return None;
        }

        let member = self.members.remove(index);
        info!(room_id = %self.id, user_id = %member.user.id, %client_id, remaining = self.members.len(), "room: member left");
        Some(member.user.id)
    }

    // -------------------------------------------------------------------------
    // Mutations spanning sub-components
    // -------------------------------------------------------------------------

    /// Queue a video, or start it right away when nothing is current.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Precondition` if a video with the same id is
    /// already queued or playing.
    pub fn add_video(&mut self, submitter: Uuid, video: Video) -> Result<(), ActionError> {
        let is_current = self.player.current().is_some_and(|v| v.id == video.id);
        if is_current || self.queue.contains(video.id) {
            return Err(ActionError::Precondition("video already in room"));
        }

        if self.player.current().is_none() {
            self.player.play(video);
        } else {
            self.queue.add(submitter, video);
        }
        Ok(())
    }

    /// Promote the head of the queue to the player.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Precondition` if the queue is empty; the player
    /// is left untouched.
    pub fn skip(&mut self) -> Result<(), ActionError> {
        let Some(next) = self.queue.pop_head() else {
            return Err(ActionError::Precondition("queue is empty"));
        };
        self.player.play(next);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Broadcast
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            revision: self.revision,
            player: self.player.snapshot(),
            queue: self.queue.iter().cloned().collect(),
            chat: self.chat.messages().cloned().collect(),
            members: self
                .members
                .iter()
                .map(|m| MemberSnapshot {
                    user: m.user.clone(),
                    buffering: m.buffering,
                    connections: m.connections.len(),
                })
                .collect(),
        }
    }

    /// Publish the full state to every connection.
    pub fn broadcast_sync(&mut self) {
        self.revision += 1;
        let frame = Arc::new(ServerFrame::Sync(self.snapshot()));
        for member in &self.members {
            for outbox in member.connections.values() {
                outbox.push_sync(Arc::clone(&frame));
            }
        }
        debug!(room_id = %self.id, revision = self.revision, connections = self.connection_count(), "room: sync broadcast");
    }

    /// Publish the lightweight seek notice to every connection.
    pub fn broadcast_seeked(&self, time: u64) {
        let frame = Arc::new(ServerFrame::Seeked { time });
        for member in &self.members {
            for (client_id, outbox) in &member.connections {
                if !outbox.push_event(Arc::clone(&frame)) {
                    debug!(room_id = %self.id, %client_id, "room: event queue full, seeked dropped");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
