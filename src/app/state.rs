//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{ArenaHandle, GameArena};
use crate::ws::connections::Connections;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: ArenaHandle,
    pub connections: Arc<Connections>,
}

impl AppState {
    /// Build the state and the arena task that serves it. The caller spawns `GameArena::run`.
    pub fn new(config: Config) -> (Self, GameArena) {
        let config = Arc::new(config);

        // Outbound queues are shared between socket tasks and the arena
        let connections = Arc::new(Connections::new());

        let (arena, handle) = GameArena::new(&config.arena, connections.clone());

        let state = Self {
            config,
            arena: handle,
            connections,
        };

        (state, arena)
    }
}
