//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! The room model (`room`, `player`, `queue`, `chat`, `video`) is plain
//! synchronous state. `dispatch` applies actions to it, `registry` owns the
//! live rooms and their locks, and `users` keeps identity across rooms.

pub mod chat;
pub mod dispatch;
pub mod player;
pub mod queue;
pub mod registry;
pub mod room;
pub mod users;
pub mod video;
