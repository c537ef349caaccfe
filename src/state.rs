//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the parsed config, the registry of live rooms, and the user store.
//! Rooms live only in memory; users live in Postgres when configured.

use std::sync::Arc;

use crate::config::Config;
use crate::services::registry::RoomRegistry;
use crate::services::users::UserStore;

/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: RoomRegistry,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, users: Arc<dyn UserStore>) -> Self {
        let rooms = RoomRegistry::new(config.chat_history_limit);
        Self { config: Arc::new(config), rooms, users }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
