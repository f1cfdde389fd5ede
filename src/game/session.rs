//! Session registry - one authoritative player record per connection

use std::collections::HashMap;

use crate::ws::protocol::{PlayerInfo, RankingEntry, Vec3};

use super::PlayerId;

/// Lifecycle state of a player within their room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Health above zero, can take damage
    Alive,
    /// Killed, waiting for the respawn timer
    PendingRespawn,
    /// Reached the death limit and was removed from the room
    Eliminated,
}

/// Player state (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub room_id: String,

    // Last transform reported by the client
    pub position: Vec3,
    pub rotation: Vec3,

    pub health: i32,
    pub status: PlayerStatus,

    pub death_count: u32,
    pub kills: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, room_id: String, spawn: Vec3, health: i32) -> Self {
        Self {
            id,
            name,
            room_id,
            position: spawn,
            rotation: Vec3::default(),
            health,
            status: PlayerStatus::Alive,
            death_count: 0,
            kills: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    /// Still an occupant of `room_id` (not eliminated)
    pub fn is_occupant(&self) -> bool {
        self.status != PlayerStatus::Eliminated
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            rotation: self.rotation,
            health: self.health,
            death_count: self.death_count,
            kills: self.kills,
            room_id: self.room_id.clone(),
        }
    }

    pub fn ranking_entry(&self) -> RankingEntry {
        RankingEntry {
            name: self.name.clone(),
            kills: self.kills,
            deaths: self.death_count,
        }
    }
}

/// Registry of all connected players, keyed by connection id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: HashMap<PlayerId, Player>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `player.id`
    pub fn insert(&mut self, player: Player) -> Option<Player> {
        self.players.insert(player.id, player)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Records for `ids` in the given order, skipping unknown ids
    pub fn lookup<'a>(&'a self, ids: &'a [PlayerId]) -> impl Iterator<Item = &'a Player> + 'a {
        ids.iter().filter_map(move |id| self.players.get(id))
    }
}
