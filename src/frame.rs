//! Frame: outbound messages pushed from a room to its connections.
//!
//! ARCHITECTURE
//! ============
//! Clients send action envelopes (see `action`); the server never replies to
//! an action directly. Every outcome is observed through the frames defined
//! here, fanned out to all connections of a room:
//! - `sync`: full room snapshot after every processed action, join and part
//! - `seeked`: minimal `{time}` notice that precedes the resync of a seek
//! - `connected`: sent once per connection, before the first snapshot
//!
//! DESIGN
//! ======
//! - JSON text frames tagged by `type`, so clients switch on one field.
//! - Frames are built once per broadcast and shared as `Arc<ServerFrame>`;
//!   each connection serializes its own copy when it writes.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

use crate::services::room::RoomSnapshot;
use crate::services::users::User;

// =============================================================================
// TYPES
// =============================================================================

/// Server → client message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Greeting for a freshly upgraded connection.
    Connected {
        #[serde(rename = "clientId")]
        client_id: Uuid,
        #[serde(rename = "roomId")]
        room_id: String,
        user: User,
    },
    /// Full observable room state.
    Sync(RoomSnapshot),
    /// Playback position was moved by a member. Milliseconds.
    Seeked { time: u64 },
}

impl ServerFrame {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Sync(_) => "sync",
            Self::Seeked { .. } => "seeked",
        }
    }
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code for structured log lines.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// CLOCK
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
