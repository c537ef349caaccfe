//! Action: the inbound intent envelope.
//!
//! ARCHITECTURE
//! ============
//! Every client message is `{"name": <ActionName>, "data": <payload>}`.
//! Decoding happens in two steps:
//! 1. The envelope: `name` must be one of the closed `ActionName` set.
//! 2. The payload: `data` is decoded into the type fixed by `name`.
//!
//! Either step failing yields `ActionError::Decode`. Unknown names are
//! rejected here and never reach a handler.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::services::video::Video;

// =============================================================================
// NAMES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionName {
    UserSetBuffering,
    UserSetUsername,
    UserSetColor,
    PlayerPlay,
    PlayerPause,
    PlayerSkip,
    PlayerSeek,
    QueueAdd,
    QueueRemove,
    QueueVote,
    ChatMessage,
}

impl ActionName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserSetBuffering => "UserSetBuffering",
            Self::UserSetUsername => "UserSetUsername",
            Self::UserSetColor => "UserSetColor",
            Self::PlayerPlay => "PlayerPlay",
            Self::PlayerPause => "PlayerPause",
            Self::PlayerSkip => "PlayerSkip",
            Self::PlayerSeek => "PlayerSeek",
            Self::QueueAdd => "QueueAdd",
            Self::QueueRemove => "QueueRemove",
            Self::QueueVote => "QueueVote",
            Self::ChatMessage => "ChatMessage",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Wire shape of an inbound action before its payload is typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub name: ActionName,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A decoded action with its strongly-typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UserSetBuffering(bool),
    UserSetUsername(String),
    UserSetColor(String),
    PlayerPlay,
    PlayerPause,
    PlayerSkip,
    /// Target position in milliseconds.
    PlayerSeek(u64),
    QueueAdd(Video),
    QueueRemove(Uuid),
    QueueVote(Uuid),
    ChatMessage(String),
}

impl Action {
    /// Decode a raw text frame into an action.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Decode` if the text is not an envelope, the name
    /// is unknown, or the payload does not match the name.
    pub fn decode(text: &str) -> Result<Self, ActionError> {
        let envelope: ActionEnvelope =
            serde_json::from_str(text).map_err(|e| ActionError::Decode { name: None, reason: e.to_string() })?;
        Self::from_envelope(envelope)
    }

    /// Type the payload of an already parsed envelope.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Decode` if the payload does not match the name.
    pub fn from_envelope(envelope: ActionEnvelope) -> Result<Self, ActionError> {
        let ActionEnvelope { name, data } = envelope;
        let action = match name {
            ActionName::UserSetBuffering => Self::UserSetBuffering(payload(name, data)?),
            ActionName::UserSetUsername => Self::UserSetUsername(payload(name, data)?),
            ActionName::UserSetColor => Self::UserSetColor(payload(name, data)?),
            ActionName::PlayerPlay => Self::PlayerPlay,
            ActionName::PlayerPause => Self::PlayerPause,
            ActionName::PlayerSkip => Self::PlayerSkip,
            ActionName::PlayerSeek => Self::PlayerSeek(payload(name, data)?),
            ActionName::QueueAdd => Self::QueueAdd(payload(name, data)?),
            ActionName::QueueRemove => Self::QueueRemove(payload(name, data)?),
            ActionName::QueueVote => Self::QueueVote(payload(name, data)?),
            ActionName::ChatMessage => Self::ChatMessage(payload(name, data)?),
        };
        Ok(action)
    }

    #[must_use]
    pub fn name(&self) -> ActionName {
        match self {
            Self::UserSetBuffering(_) => ActionName::UserSetBuffering,
            Self::UserSetUsername(_) => ActionName::UserSetUsername,
            Self::UserSetColor(_) => ActionName::UserSetColor,
            Self::PlayerPlay => ActionName::PlayerPlay,
            Self::PlayerPause => ActionName::PlayerPause,
            Self::PlayerSkip => ActionName::PlayerSkip,
            Self::PlayerSeek(_) => ActionName::PlayerSeek,
            Self::QueueAdd(_) => ActionName::QueueAdd,
            Self::QueueRemove(_) => ActionName::QueueRemove,
            Self::QueueVote(_) => ActionName::QueueVote,
            Self::ChatMessage(_) => ActionName::ChatMessage,
        }
    }
}

fn payload<T: DeserializeOwned>(name: ActionName, data: serde_json::Value) -> Result<T, ActionError> {
    serde_json::from_value(data).map_err(|e| ActionError::Decode { name: Some(name), reason: e.to_string() })
}

// =============================================================================
// ERRORS
// =============================================================================

/// Why an action had no effect. Never sent to the client; the next snapshot
/// is the only feedback it gets.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("decode failed: {reason}")]
    Decode { name: Option<ActionName>, reason: String },
    #[error("video not found: {0}")]
    NotFound(Uuid),
    #[error("precondition failed: {0}")]
    Precondition(&'static str),
    #[error("user {0} is not a member of this room")]
    NotMember(Uuid),
    #[error("user {0} may not update this room")]
    Forbidden(Uuid),
}

impl ErrorCode for ActionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "E_DECODE",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Precondition(_) => "E_PRECONDITION",
            Self::NotMember(_) => "E_NOT_MEMBER",
            Self::Forbidden(_) => "E_FORBIDDEN",
        }
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
