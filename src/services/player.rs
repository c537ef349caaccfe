//! Player: authoritative playback state for one room.
//!
//! DESIGN
//! ======
//! The player stores a position anchor plus the instant it was taken. While
//! playing, the live position is `anchor + elapsed`; while paused it is the
//! anchor. Every transition re-anchors, so pausing freezes the running
//! position and seeking never touches the playing flag.
//!
//! The `*_at` variants take an explicit instant for deterministic tests.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::action::ActionError;
use crate::frame::now_ms;
use crate::services::video::Video;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Empty,
    Paused,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    video: Option<Video>,
    playing: bool,
    /// Position in milliseconds at `anchored_at`.
    anchor_ms: u64,
    anchored_at: Instant,
}

/// Wire view of the player inside a room snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    pub video: Option<Video>,
    pub playing: bool,
    /// Position in milliseconds at `sampled_at`.
    pub time: u64,
    /// Server clock (ms since epoch) when `time` was sampled. Clients add
    /// their own elapsed time while `playing` is true.
    pub sampled_at: i64,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    #[must_use]
    pub fn new() -> Self {
        Self { video: None, playing: false, anchor_ms: 0, anchored_at: Instant::now() }
    }

    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        match (&self.video, self.playing) {
            (None, _) => PlayerStatus::Empty,
            (Some(_), false) => PlayerStatus::Paused,
            (Some(_), true) => PlayerStatus::Playing,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Video> {
        self.video.as_ref()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn position_ms(&self) -> u64 {
        self.position_at(Instant::now())
    }

    pub(crate) fn position_at(&self, now: Instant) -> u64 {
        if !self.playing {
            return self.anchor_ms;
        }
        let elapsed = now.saturating_duration_since(self.anchored_at).as_millis();
        self.anchor_ms
            .saturating_add(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }

    /// Start `video` from the beginning, replacing whatever was current.
    pub fn play(&mut self, video: Video) {
        self.play_at(video, Instant::now());
    }

    pub(crate) fn play_at(&mut self, video: Video, now: Instant) {
        info!(video_id = %video.id, title = %video.title, "player: play");
        self.video = Some(video);
        self.playing = true;
        self.anchor_ms = 0;
        self.anchored_at = now;
    }

    /// Play the current video again from the beginning.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Precondition` when no video is current.
    pub fn restart(&mut self) -> Result<(), ActionError> {
        self.restart_at(Instant::now())
    }

    pub(crate) fn restart_at(&mut self, now: Instant) -> Result<(), ActionError> {
        let Some(current) = self.video.take() else {
            return Err(ActionError::Precondition("no current video to play"));
        };
        self.play_at(current, now);
        Ok(())
    }

    /// Freeze playback at the running position.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Precondition` when no video is current.
    pub fn pause(&mut self) -> Result<(), ActionError> {
        self.pause_at(Instant::now())
    }

    pub(crate) fn pause_at(&mut self, now: Instant) -> Result<(), ActionError> {
        if self.video.is_none() {
            return Err(ActionError::Precondition("no current video to pause"));
        }
        if self.playing {
            self.anchor_ms = self.position_at(now);
            self.anchored_at = now;
            self.playing = false;
        }
        Ok(())
    }

    /// Move the position. Applies in every state and keeps the playing flag.
    pub fn seek(&mut self, time_ms: u64) {
        self.seek_at(time_ms, Instant::now());
    }

    pub(crate) fn seek_at(&mut self, time_ms: u64, now: Instant) {
        self.anchor_ms = time_ms;
        self.anchored_at = now;
    }

    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            status: self.status(),
            video: self.video.clone(),
            playing: self.playing,
            time: self.position_ms(),
            sampled_at: now_ms(),
        }
    }
}

#[cfg(test)]
#[path = "player_test.rs"]
mod tests;
