//! Event dispatcher - the authoritative combat/session state machine
//!
//! Every handler runs to completion against the registries and returns the
//! [`Effects`] it produced. Delivery and timers are left to the caller.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::ArenaConfig;
use crate::ws::protocol::{ClientMsg, PlayerInfo, ServerMsg, Vec3};

use super::combat::{ranking, CombatRules, CombatSystem, DamageOutcome};
use super::room::{LeaveOutcome, RoomRegistry};
use super::session::{Player, PlayerStatus, SessionRegistry};
use super::spawn::SpawnSelector;
use super::PlayerId;

/// A message addressed to a single connection
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: PlayerId,
    pub msg: ServerMsg,
}

/// Side effects produced by one handled event
#[derive(Debug, Default)]
pub struct Effects {
    /// Messages to deliver, in emission order
    pub outbound: Vec<Outbound>,
    /// Players whose respawn timer should start
    pub schedule_respawn: Vec<PlayerId>,
    /// Players whose pending respawn timer should be dropped
    pub cancel_respawn: Vec<PlayerId>,
}

impl Effects {
    pub fn send(&mut self, to: PlayerId, msg: ServerMsg) {
        self.outbound.push(Outbound { to, msg });
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.schedule_respawn.is_empty() && self.cancel_respawn.is_empty()
    }
}

/// Owns the session and room registries and applies client intents to them
pub struct Dispatcher {
    sessions: SessionRegistry,
    rooms: RoomRegistry,
    spawner: SpawnSelector,
    rules: CombatRules,
    default_room: String,
    rng: ChaCha8Rng,
}

impl Dispatcher {
    pub fn new(config: &ArenaConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            sessions: SessionRegistry::new(),
            rooms: RoomRegistry::new(),
            spawner: SpawnSelector::new(config.spawn),
            rules: CombatRules {
                max_health: config.max_health,
                death_limit: config.death_limit,
            },
            default_room: config.default_room.clone(),
            rng,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Route a client intent to its handler
    pub fn handle(&mut self, player_id: PlayerId, msg: ClientMsg) -> Effects {
        match msg {
            ClientMsg::JoinGame {
                player_name,
                room_id,
            } => self.join(player_id, player_name, room_id),
            ClientMsg::PlayerMove { position, rotation } => {
                self.player_move(player_id, position, rotation)
            }
            ClientMsg::PlayerShoot { origin, direction } => {
                self.player_shoot(player_id, origin, direction)
            }
            ClientMsg::PlayerDamage {
                target_id,
                damage,
                shooter_id,
            } => self.report_damage(player_id, target_id, damage, shooter_id),
        }
    }

    /// Register a player in a room and hand out a spawn point
    pub fn join(
        &mut self,
        player_id: PlayerId,
        player_name: Option<String>,
        room_id: Option<String>,
    ) -> Effects {
        let mut effects = Effects::default();

        // A connection lives in one room at a time; re-joining starts over.
        if self.sessions.contains(&player_id) {
            self.leave_room(player_id, &mut effects);
            effects.cancel_respawn.push(player_id);
        }

        let room_id = room_id
            .filter(|room| !room.is_empty())
            .unwrap_or_else(|| self.default_room.clone());
        let name = player_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Player_{}", self.rng.gen_range(0..10_000)));

        let occupants = self.occupant_positions(&room_id, Some(player_id));
        let spawn = self.spawner.select(&mut self.rng, &occupants);

        let count = self.rooms.join(&room_id, player_id);
        let player = Player::new(
            player_id,
            name,
            room_id.clone(),
            spawn,
            self.rules.max_health,
        );
        let info = player.info();
        self.sessions.insert(player);

        let roster: Vec<PlayerInfo> = self
            .sessions
            .lookup(self.rooms.members(&room_id))
            .filter(|p| p.id != player_id)
            .map(Player::info)
            .collect();

        effects.send(player_id, ServerMsg::CurrentPlayers(roster));
        effects.send(player_id, ServerMsg::InitialSpawn { position: spawn });
        self.broadcast(
            &mut effects,
            &room_id,
            Some(player_id),
            ServerMsg::PlayerJoined(info.clone()),
        );
        self.broadcast(&mut effects, &room_id, None, ServerMsg::PlayerCountUpdate(count));

        info!(
            player_id = %player_id,
            name = %info.name,
            room_id = %room_id,
            player_count = count,
            "Player joined room"
        );

        effects
    }

    /// Store and relay a client-reported transform
    pub fn player_move(&mut self, player_id: PlayerId, position: Vec3, rotation: Vec3) -> Effects {
        let mut effects = Effects::default();

        let Some(player) = self.sessions.get_mut(&player_id) else {
            debug!(player_id = %player_id, "Move from unknown player");
            return effects;
        };
        if !player.is_occupant() {
            return effects;
        }

        player.position = position;
        player.rotation = rotation;
        let room_id = player.room_id.clone();

        self.broadcast(
            &mut effects,
            &room_id,
            Some(player_id),
            ServerMsg::PlayerMoved {
                id: player_id,
                position,
                rotation,
            },
        );
        effects
    }

    /// Relay a cosmetic shot to the rest of the room
    pub fn player_shoot(&mut self, player_id: PlayerId, origin: Vec3, direction: Vec3) -> Effects {
        let mut effects = Effects::default();

        let Some(player) = self.sessions.get(&player_id) else {
            debug!(player_id = %player_id, "Shot from unknown player");
            return effects;
        };
        if !player.is_occupant() {
            return effects;
        }
        let room_id = player.room_id.clone();

        self.broadcast(
            &mut effects,
            &room_id,
            Some(player_id),
            ServerMsg::PlayerShot {
                id: player_id,
                origin,
                direction,
            },
        );
        effects
    }

    /// Apply a self-reported hit. The damage value is trusted as sent.
    pub fn report_damage(
        &mut self,
        reporter: PlayerId,
        target_id: PlayerId,
        damage: i32,
        shooter_id: PlayerId,
    ) -> Effects {
        let mut effects = Effects::default();

        let Some(shooter_name) = self.sessions.get(&shooter_id).map(|s| s.name.clone()) else {
            debug!(shooter_id = %shooter_id, target_id = %target_id, "Damage from unknown shooter");
            return effects;
        };
        let Some(target) = self.sessions.get_mut(&target_id) else {
            debug!(shooter_id = %shooter_id, target_id = %target_id, "Damage to unknown target");
            return effects;
        };

        if reporter != shooter_id {
            debug!(
                reporter = %reporter,
                shooter_id = %shooter_id,
                "Damage reported on behalf of another shooter"
            );
        }

        let outcome = CombatSystem::apply_damage(target, damage, &self.rules);
        if outcome == DamageOutcome::Ignored {
            debug!(victim = %target.name, "Ignoring damage, target already dead");
            return effects;
        }

        let victim_name = target.name.clone();
        let room_id = target.room_id.clone();
        let death_count = target.death_count;

        effects.send(
            target_id,
            ServerMsg::TakeDamage {
                damage,
                shooter_id,
                shooter_name: shooter_name.clone(),
                new_health: target.health,
            },
        );

        if let DamageOutcome::Wounded { health } = outcome {
            debug!(victim = %victim_name, health, "Player wounded");
            return effects;
        }

        let Some(shooter) = self.sessions.get_mut(&shooter_id) else {
            return effects;
        };
        shooter.kills += 1;
        let total_kills = shooter.kills;

        info!(
            killer = %shooter_name,
            victim = %victim_name,
            total_kills,
            death_count,
            "Player killed"
        );

        effects.send(
            shooter_id,
            ServerMsg::KillConfirmed {
                victim_id: target_id,
                victim_name: victim_name.clone(),
                total_kills,
            },
        );
        self.broadcast(
            &mut effects,
            &room_id,
            None,
            ServerMsg::PlayerKilled {
                killer_id: shooter_id,
                killer_name: shooter_name,
                victim_id: target_id,
                victim_name,
            },
        );

        match outcome {
            DamageOutcome::Eliminated => self.eliminate(target_id, &room_id, death_count, &mut effects),
            DamageOutcome::Killed => effects.schedule_respawn.push(target_id),
            DamageOutcome::Ignored | DamageOutcome::Wounded { .. } => {}
        }

        effects
    }

    /// Bring a dead player back at a fresh spawn point.
    ///
    /// No-op unless the player still exists and is awaiting respawn.
    pub fn respawn(&mut self, player_id: PlayerId) -> Effects {
        let mut effects = Effects::default();

        let Some(room_id) = self
            .sessions
            .get(&player_id)
            .filter(|p| p.status == PlayerStatus::PendingRespawn)
            .map(|p| p.room_id.clone())
        else {
            debug!(player_id = %player_id, "Stale respawn, player gone or not dead");
            return effects;
        };

        // The dead player's last position counts, pushing the respawn away from it.
        let occupants = self.occupant_positions(&room_id, None);
        let position = self.spawner.select_with_jitter(&mut self.rng, &occupants);

        let Some(player) = self.sessions.get_mut(&player_id) else {
            return effects;
        };
        CombatSystem::revive(player, &self.rules);
        player.position = position;

        info!(player_id = %player_id, name = %player.name, "Player respawned");

        effects.send(
            player_id,
            ServerMsg::Respawn {
                health: player.health,
                position,
            },
        );
        effects
    }

    /// Drop a connection's player and tell the room
    pub fn disconnect(&mut self, player_id: PlayerId) -> Effects {
        let mut effects = Effects::default();

        if !self.sessions.contains(&player_id) {
            return effects;
        }

        effects.cancel_respawn.push(player_id);
        self.leave_room(player_id, &mut effects);
        self.sessions.remove(&player_id);

        info!(
            player_id = %player_id,
            remaining = self.sessions.len(),
            "Player disconnected"
        );

        effects
    }

    fn eliminate(&mut self, target_id: PlayerId, room_id: &str, death_count: u32, effects: &mut Effects) {
        // Standings are taken before removal so the eliminated player is listed.
        let standings = ranking(self.sessions.lookup(self.rooms.members(room_id)));

        effects.send(
            target_id,
            ServerMsg::DeathLimitReached {
                death_count,
                ranking: standings,
            },
        );

        let outcome = self.rooms.leave(room_id, target_id);
        self.announce_departure(room_id, target_id, outcome, effects);

        info!(player_id = %target_id, room_id = %room_id, "Player eliminated");
    }

    fn leave_room(&mut self, player_id: PlayerId, effects: &mut Effects) {
        let Some(room_id) = self.sessions.get(&player_id).map(|p| p.room_id.clone()) else {
            return;
        };

        let outcome = self.rooms.leave(&room_id, player_id);
        self.announce_departure(&room_id, player_id, outcome, effects);
    }

    fn announce_departure(
        &self,
        room_id: &str,
        player_id: PlayerId,
        outcome: LeaveOutcome,
        effects: &mut Effects,
    ) {
        match outcome {
            LeaveOutcome::Left { remaining } => {
                self.broadcast(effects, room_id, None, ServerMsg::PlayerLeft(player_id));
                self.broadcast(effects, room_id, None, ServerMsg::PlayerCountUpdate(remaining));
            }
            LeaveOutcome::Closed => {
                info!(room_id = %room_id, "Room closed");
            }
            LeaveOutcome::NotMember => {}
        }
    }

    fn occupant_positions(&self, room_id: &str, exclude: Option<PlayerId>) -> Vec<Vec3> {
        self.sessions
            .lookup(self.rooms.members(room_id))
            .filter(|p| Some(p.id) != exclude)
            .map(|p| p.position)
            .collect()
    }

    fn broadcast(&self, effects: &mut Effects, room_id: &str, except: Option<PlayerId>, msg: ServerMsg) {
        for member in self.rooms.members(room_id) {
            if Some(*member) != except {
                effects.send(*member, msg.clone());
            }
        }
    }
}
