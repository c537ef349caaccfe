//! Video descriptor and vote bookkeeping.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A video as submitted by a client and tracked by the room.
///
/// `id` is assigned by the server when the client omits it. `votes` is never
/// read from the wire: only the queue hands out votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Playable URL or provider-specific identifier.
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_deserializing)]
    votes: BTreeSet<Uuid>,
}

impl Video {
    #[must_use]
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            title: title.into(),
            thumbnail: None,
            duration_ms: None,
            votes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    #[must_use]
    pub fn has_vote(&self, user_id: Uuid) -> bool {
        self.votes.contains(&user_id)
    }

    /// Returns `false` if the user had already voted.
    pub fn add_vote(&mut self, user_id: Uuid) -> bool {
        self.votes.insert(user_id)
    }

    /// Returns `false` if the user had not voted.
    pub fn remove_vote(&mut self, user_id: Uuid) -> bool {
        self.votes.remove(&user_id)
    }

    /// Flip the user's vote. Returns whether the user votes afterwards.
    pub fn toggle_vote(&mut self, user_id: Uuid) -> bool {
        if self.remove_vote(user_id) {
            false
        } else {
            self.add_vote(user_id)
        }
    }
}
