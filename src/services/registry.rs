//! Room registry: create-if-absent map of live rooms.
//!
//! DESIGN
//! ======
//! The map sits behind an `RwLock`; each room behind its own `Mutex`. The
//! room mutex is the serialization point: one action's
//! decode → mutate → broadcast completes before the next one for the same
//! room starts. Different rooms never share a lock past the brief map
//! lookup.
//!
//! LIFECYCLE
//! =========
//! A room is created by the first join and removed from the map when its
//! last connection leaves. Nothing about a room survives eviction.
//!
//! The map lock is never held while waiting for a room, so a busy room
//! cannot stall lookups for any other room. Where both are needed the
//! order is room → map:
//! - `leave` evicts while still holding the emptied room's lock, and only
//!   if the map still points at that same room.
//! - `join` re-checks after locking that the room is still the one in the
//!   map; a join that lost the race to an eviction starts over with a
//!   fresh room.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::services::dispatch::{self, DispatchReport, Effect};
use crate::services::room::{Outbox, Room};
use crate::services::users::{User, UserStore};

pub type SharedRoom = Arc<Mutex<Room>>;

/// Listing entry for live rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub members: usize,
    pub connections: usize,
}

#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, SharedRoom>>>,
    chat_limit: Option<usize>,
}

impl RoomRegistry {
    #[must_use]
    pub fn new(chat_limit: Option<usize>) -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())), chat_limit }
    }

    /// Attach a connection to `room_id`, creating the room if needed, and
    /// publish a snapshot so everyone sees the new member.
    pub async fn join(&self, room_id: &str, user: User, client_id: Uuid, outbox: Outbox) -> SharedRoom {
        loop {
            let shared = self.get_or_create(room_id).await;
            let mut room = shared.lock().await;
            if !self.is_current(room_id, &shared).await {
                // Evicted between lookup and lock.
                continue;
            }

            room.join(user, client_id, outbox);
            room.broadcast_sync();
            drop(room);
            return shared;
        }
    }

    /// Detach a connection. Evicts the room once nobody is left, otherwise
    /// publishes a snapshot with the updated member list.
    pub async fn leave(&self, room_id: &str, client_id: Uuid) {
        let Some(shared) = self.get(room_id).await else {
            return;
        };

        let mut room = shared.lock().await;
        room.leave(client_id);
        if !room.is_empty() {
            room.broadcast_sync();
            return;
        }

        let mut rooms = self.rooms.write().await;
        if rooms.get(room_id).is_some_and(|current| Arc::ptr_eq(current, &shared)) {
            rooms.remove(room_id);
            info!(%room_id, remaining = rooms.len(), "registry: room evicted");
        }
    }

    /// Run one inbound frame through the dispatcher under the room lock.
    /// Returns `None` if the room does not exist.
    pub async fn dispatch(&self, room_id: &str, user_id: Uuid, text: &str) -> Option<DispatchReport> {
        let shared = self.get(room_id).await?;
        let mut room = shared.lock().await;
        Some(dispatch::dispatch(&mut room, user_id, text))
    }

    /// Like `dispatch`, but writes profile edits to `users` before the room
    /// lock is released, so store writes land in the same order as the
    /// actions that caused them.
    pub async fn dispatch_persisting(
        &self,
        room_id: &str,
        user_id: Uuid,
        text: &str,
        users: &dyn UserStore,
    ) -> Option<DispatchReport> {
        let shared = self.get(room_id).await?;
        let mut room = shared.lock().await;
        let report = dispatch::dispatch(&mut room, user_id, text);

        if let Ok(Effect::ProfileChanged(user)) = &report.outcome {
            if let Err(e) = users.update(user).await {
                warn!(%room_id, %user_id, code = e.error_code(), error = %e, "registry: profile write-back failed");
            }
        }
        drop(room);

        Some(report)
    }

    pub async fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    async fn get_or_create(&self, room_id: &str) -> SharedRoom {
        if let Some(shared) = self.get(room_id).await {
            return shared;
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| {
                info!(%room_id, "registry: room created");
                Arc::new(Mutex::new(Room::new(room_id, self.chat_limit)))
            })
            .clone()
    }

    async fn is_current(&self, room_id: &str, shared: &SharedRoom) -> bool {
        self.rooms
            .read()
            .await
            .get(room_id)
            .is_some_and(|current| Arc::ptr_eq(current, shared))
    }

    /// Live rooms sorted by id.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let shared: Vec<(String, SharedRoom)> = self
            .rooms
            .read()
            .await
            .iter()
            .map(|(id, room)| (id.clone(), Arc::clone(room)))
            .collect();

        let mut out = Vec::with_capacity(shared.len());
        for (id, room) in shared {
            let room = room.lock().await;
            out.push(RoomSummary { id, members: room.member_count(), connections: room.connection_count() });
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
