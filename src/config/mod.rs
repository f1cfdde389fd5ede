//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::game::spawn::SpawnConfig;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated, `*` for any)
    pub client_origin: String,
    /// Gameplay rules for the arena
    pub arena: ArenaConfig,
}

/// Combat and session rules applied by the arena event loop
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Room joined when the client does not name one
    pub default_room: String,
    /// Deaths before a player is eliminated from the room
    pub death_limit: u32,
    /// Health on join and after respawn
    pub max_health: i32,
    /// Delay between a non-final death and the respawn
    pub respawn_delay: Duration,
    /// Spawn placement parameters
    pub spawn: SpawnConfig,
    /// Fixed RNG seed, random when unset
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            default_room: "default".to_string(),
            death_limit: 10,
            max_health: 100,
            respawn_delay: Duration::from_millis(3000),
            spawn: SpawnConfig::default(),
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3001".to_string())
        };

        let defaults = ArenaConfig::default();
        let spawn_defaults = SpawnConfig::default();

        let arena = ArenaConfig {
            default_room: lookup("DEFAULT_ROOM")
                .filter(|room| !room.is_empty())
                .unwrap_or(defaults.default_room),
            death_limit: positive(&lookup, "DEATH_LIMIT", defaults.death_limit)?,
            max_health: positive(&lookup, "MAX_HEALTH", defaults.max_health)?,
            respawn_delay: Duration::from_millis(parse_or(
                &lookup,
                "RESPAWN_DELAY_MS",
                defaults.respawn_delay.as_millis() as u64,
            )?),
            spawn: SpawnConfig {
                candidates: positive(&lookup, "SPAWN_CANDIDATES", spawn_defaults.candidates)?,
                half_extent: extent(&lookup, "ARENA_HALF_EXTENT", spawn_defaults.half_extent)?,
                jitter: extent(&lookup, "SPAWN_JITTER", spawn_defaults.jitter)?,
            },
            seed: lookup("ARENA_SEED")
                .map(|raw| {
                    raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                        var: "ARENA_SEED",
                        value: raw,
                    })
                })
                .transpose()?,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
            arena,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected
fn positive<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + ToString,
{
    let value = parse_or(lookup, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// A finite, non-negative distance. Spawn sampling cannot use infinite bounds.
fn extent<F>(lookup: &F, var: &'static str, default: f32) -> Result<f32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, var, default)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[])));

        assert_eq!(config.server_addr.port(), 3001);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.client_origin, "*");
        assert_eq!(config.arena.default_room, "default");
        assert_eq!(config.arena.death_limit, 10);
        assert_eq!(config.arena.max_health, 100);
        assert_eq!(config.arena.respawn_delay, Duration::from_secs(3));
        assert_eq!(config.arena.spawn.candidates, 20);
        assert!(config.arena.seed.is_none());
    }

    #[test]
    fn port_takes_precedence_over_server_addr() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("SERVER_ADDR", "127.0.0.1:7000"),
        ])));

        assert_eq!(config.server_addr.port(), 9000);
    }

    #[test]
    fn overrides_arena_rules() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[
            ("DEATH_LIMIT", "3"),
            ("RESPAWN_DELAY_MS", "500"),
            ("ARENA_SEED", "42"),
            ("DEFAULT_ROOM", "lobby"),
        ])));

        assert_eq!(config.arena.death_limit, 3);
        assert_eq!(config.arena.respawn_delay, Duration::from_millis(500));
        assert_eq!(config.arena.seed, Some(42));
        assert_eq!(config.arena.default_room, "lobby");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            assert_err!(Config::from_lookup(lookup_from(&[("DEATH_LIMIT", "ten")]))),
            ConfigError::Invalid { var: "DEATH_LIMIT", .. }
        ));
        assert!(matches!(
            assert_err!(Config::from_lookup(lookup_from(&[("SPAWN_CANDIDATES", "0")]))),
            ConfigError::Invalid { var: "SPAWN_CANDIDATES", .. }
        ));
        assert!(matches!(
            assert_err!(Config::from_lookup(lookup_from(&[("SERVER_ADDR", "nowhere")]))),
            ConfigError::InvalidAddress
        ));
    }

    #[test]
    fn rejects_spawn_extents_that_cannot_be_sampled() {
        for (var, value) in [
            ("ARENA_HALF_EXTENT", "inf"),
            ("ARENA_HALF_EXTENT", "-10"),
            ("SPAWN_JITTER", "NaN"),
            ("SPAWN_JITTER", "-inf"),
        ] {
            let err = assert_err!(Config::from_lookup(lookup_from(&[(var, value)])));
            assert!(
                matches!(err, ConfigError::Invalid { var: v, .. } if v == var),
                "{var}={value} should be rejected"
            );
        }

        let config = assert_ok!(Config::from_lookup(lookup_from(&[
            ("ARENA_HALF_EXTENT", "25.5"),
            ("SPAWN_JITTER", "0"),
        ])));
        assert_eq!(config.arena.spawn.half_extent, 25.5);
        assert_eq!(config.arena.spawn.jitter, 0.0);
    }
}
