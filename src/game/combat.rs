//! Combat rules - damage application, death accounting, standings

use crate::ws::protocol::RankingEntry;

use super::session::{Player, PlayerStatus};

/// Combat rules shared by every room
#[derive(Debug, Clone, Copy)]
pub struct CombatRules {
    pub max_health: i32,
    pub death_limit: u32,
}

/// What a damage report did to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was not alive, nothing changed
    Ignored,
    /// Target survived
    Wounded { health: i32 },
    /// Target died and will respawn
    Killed,
    /// Target died and reached the death limit
    Eliminated,
}

/// Combat system for applying reported damage
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to a target, updating health, status and death count
    pub fn apply_damage(target: &mut Player, damage: i32, rules: &CombatRules) -> DamageOutcome {
        if !target.is_alive() {
            return DamageOutcome::Ignored;
        }

        let remaining = target.health.saturating_sub(damage);
        if remaining > 0 {
            target.health = remaining.min(rules.max_health);
            return DamageOutcome::Wounded {
                health: target.health,
            };
        }

        target.health = 0;
        target.death_count += 1;

        if target.death_count >= rules.death_limit {
            target.status = PlayerStatus::Eliminated;
            DamageOutcome::Eliminated
        } else {
            target.status = PlayerStatus::PendingRespawn;
            DamageOutcome::Killed
        }
    }

    /// Restore a dead player. Returns false if they are not awaiting respawn.
    pub fn revive(player: &mut Player, rules: &CombatRules) -> bool {
        if player.status != PlayerStatus::PendingRespawn {
            return false;
        }
        player.health = rules.max_health;
        player.status = PlayerStatus::Alive;
        true
    }
}

/// Standings sorted by kills, highest first. Equal kills keep input order.
pub fn ranking<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = players.into_iter().map(Player::ranking_entry).collect();
    entries.sort_by(|a, b| b.kills.cmp(&a.kills));
    entries
}
