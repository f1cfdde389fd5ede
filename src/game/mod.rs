//! Game session and combat modules

pub mod arena;
pub mod combat;
pub mod dispatch;
pub mod room;
pub mod session;
pub mod spawn;

pub use arena::{ArenaEvent, ArenaHandle, GameArena};

/// Connection identity, also the player's wire id
pub type PlayerId = uuid::Uuid;
