//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is `{"type": "<event-name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// A 3D vector as sent by the browser client
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the horizontal (x/z) plane
    pub fn planar_distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMsg {
    /// Register as a player and enter a room
    JoinGame {
        #[serde(default)]
        player_name: Option<String>,
        #[serde(default)]
        room_id: Option<String>,
    },

    /// Report own transform
    PlayerMove { position: Vec3, rotation: Vec3 },

    /// Report a cosmetic shot
    PlayerShoot { origin: Vec3, direction: Vec3 },

    /// Report a hit on another player
    PlayerDamage {
        target_id: PlayerId,
        damage: i32,
        shooter_id: PlayerId,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMsg {
    /// Roster of the other room occupants, sent to a new joiner
    CurrentPlayers(Vec<PlayerInfo>),

    /// Spawn point for a new joiner
    InitialSpawn { position: Vec3 },

    /// A new occupant entered the room
    PlayerJoined(PlayerInfo),

    /// Relayed transform of another occupant
    PlayerMoved {
        id: PlayerId,
        position: Vec3,
        rotation: Vec3,
    },

    /// Relayed cosmetic shot of another occupant
    PlayerShot {
        id: PlayerId,
        origin: Vec3,
        direction: Vec3,
    },

    /// Sent to the victim of a damage report
    TakeDamage {
        damage: i32,
        shooter_id: PlayerId,
        shooter_name: String,
        new_health: i32,
    },

    /// Authoritative kill credit for the shooter
    KillConfirmed {
        victim_id: PlayerId,
        victim_name: String,
        total_kills: u32,
    },

    /// Kill-feed entry for the whole room
    PlayerKilled {
        killer_id: PlayerId,
        killer_name: String,
        victim_id: PlayerId,
        victim_name: String,
    },

    /// Authoritative respawn for the dead player
    Respawn { health: i32, position: Vec3 },

    /// Elimination notice with final standings
    DeathLimitReached {
        death_count: u32,
        ranking: Vec<RankingEntry>,
    },

    /// An occupant left the room
    PlayerLeft(PlayerId),

    /// Room occupant count changed
    PlayerCountUpdate(usize),
}

/// Full player record as announced to peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub health: i32,
    pub death_count: u32,
    pub kills: u32,
    pub room_id: String,
}

/// One row of the elimination standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
}
