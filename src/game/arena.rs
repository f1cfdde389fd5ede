//! Arena event loop - serializes all registry access and owns respawn timers

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ArenaConfig;
use crate::ws::connections::Connections;
use crate::ws::protocol::ClientMsg;

use super::dispatch::{Dispatcher, Effects, Outbound};
use super::PlayerId;

/// Inbound queue depth for the arena task
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Everything the arena task reacts to
#[derive(Debug)]
pub enum ArenaEvent {
    /// Intent received from a connected client
    Client { player_id: PlayerId, msg: ClientMsg },
    /// Socket closed
    Disconnected { player_id: PlayerId },
    /// A respawn timer elapsed
    RespawnDue { player_id: PlayerId, timer_id: u64 },
}

/// Counters published by the arena for the health endpoint
#[derive(Debug, Default)]
pub struct ArenaStats {
    players: AtomicUsize,
    rooms: AtomicUsize,
}

impl ArenaStats {
    pub fn players(&self) -> usize {
        self.players.load(Ordering::Relaxed)
    }

    pub fn rooms(&self) -> usize {
        self.rooms.load(Ordering::Relaxed)
    }
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    event_tx: mpsc::Sender<ArenaEvent>,
    stats: Arc<ArenaStats>,
}

impl ArenaHandle {
    /// Queue an event. Returns false once the arena task is gone.
    pub async fn send(&self, event: ArenaEvent) -> bool {
        self.event_tx.send(event).await.is_ok()
    }

    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }
}

struct RespawnTimer {
    id: u64,
    task: JoinHandle<()>,
}

/// The authoritative arena: one task, one event at a time
pub struct GameArena {
    dispatcher: Dispatcher,
    event_rx: mpsc::Receiver<ArenaEvent>,
    event_tx: mpsc::Sender<ArenaEvent>,
    connections: Arc<Connections>,
    respawn_delay: Duration,
    respawn_timers: HashMap<PlayerId, RespawnTimer>,
    next_timer_id: u64,
    stats: Arc<ArenaStats>,
}

impl GameArena {
    /// Create a new arena
    pub fn new(config: &ArenaConfig, connections: Arc<Connections>) -> (Self, ArenaHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let stats = Arc::new(ArenaStats::default());

        let handle = ArenaHandle {
            event_tx: event_tx.clone(),
            stats: stats.clone(),
        };

        let arena = Self {
            dispatcher: Dispatcher::new(config),
            event_rx,
            event_tx,
            connections,
            respawn_delay: config.respawn_delay,
            respawn_timers: HashMap::new(),
            next_timer_id: 0,
            stats,
        };

        (arena, handle)
    }

    /// Process events for the lifetime of the server.
    ///
    /// The arena keeps a sender for its own timers, so the queue never closes.
    pub async fn run(mut self) {
        info!("Arena started");

        while let Some(event) = self.event_rx.recv().await {
            self.process(event);
        }
    }

    /// Handle a single event to completion
    pub fn process(&mut self, event: ArenaEvent) {
        let effects = match event {
            ArenaEvent::Client { player_id, msg } => self.dispatcher.handle(player_id, msg),
            ArenaEvent::Disconnected { player_id } => self.dispatcher.disconnect(player_id),
            ArenaEvent::RespawnDue {
                player_id,
                timer_id,
            } => {
                let current = self.respawn_timers.get(&player_id).map(|timer| timer.id);
                if current != Some(timer_id) {
                    debug!(player_id = %player_id, timer_id, "Dropping superseded respawn timer");
                    return;
                }
                self.respawn_timers.remove(&player_id);
                self.dispatcher.respawn(player_id)
            }
        };

        self.apply(effects);
        self.publish_stats();
    }

    /// Number of respawn timers still pending
    #[cfg(test)]
    pub fn pending_respawns(&self) -> usize {
        self.respawn_timers.len()
    }

    fn apply(&mut self, effects: Effects) {
        for player_id in effects.cancel_respawn {
            if let Some(timer) = self.respawn_timers.remove(&player_id) {
                timer.task.abort();
                debug!(player_id = %player_id, "Cancelled pending respawn");
            }
        }

        for player_id in effects.schedule_respawn {
            self.schedule_respawn(player_id);
        }

        for Outbound { to, msg } in effects.outbound {
            self.connections.deliver(to, msg);
        }
    }

    fn schedule_respawn(&mut self, player_id: PlayerId) {
        self.next_timer_id += 1;
        let timer_id = self.next_timer_id;
        let delay = self.respawn_delay;
        let event_tx = self.event_tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if event_tx
                .send(ArenaEvent::RespawnDue {
                    player_id,
                    timer_id,
                })
                .await
                .is_err()
            {
                warn!(player_id = %player_id, "Arena gone before respawn");
            }
        });

        if let Some(previous) = self
            .respawn_timers
            .insert(player_id, RespawnTimer { id: timer_id, task })
        {
            previous.task.abort();
        }
    }

    fn publish_stats(&self) {
        self.stats
            .players
            .store(self.dispatcher.sessions().len(), Ordering::Relaxed);
        self.stats
            .rooms
            .store(self.dispatcher.rooms().len(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::ServerMsg;
    use tokio::time::Instant;
    use uuid::Uuid;

    fn config() -> ArenaConfig {
        ArenaConfig {
            seed: Some(11),
            ..ArenaConfig::default()
        }
    }

    fn join(player_id: PlayerId, name: &str) -> ArenaEvent {
        ArenaEvent::Client {
            player_id,
            msg: ClientMsg::JoinGame {
                player_name: Some(name.to_string()),
                room_id: None,
            },
        }
    }

    fn kill(shooter: PlayerId, target: PlayerId) -> ArenaEvent {
        ArenaEvent::Client {
            player_id: shooter,
            msg: ClientMsg::PlayerDamage {
                target_id: target,
                damage: 100,
                shooter_id: shooter,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn respawn_arrives_after_the_delay() {
        let connections = Arc::new(Connections::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = connections.register(a);
        let _rx_b = connections.register(b);

        let (arena, handle) = GameArena::new(&config(), connections.clone());
        tokio::spawn(arena.run());

        assert!(handle.send(join(a, "A")).await);
        assert!(handle.send(join(b, "B")).await);
        let killed_at = Instant::now();
        assert!(handle.send(kill(b, a)).await);

        loop {
            match rx_a.recv().await.expect("connection open") {
                ServerMsg::Respawn { health, .. } => {
                    assert_eq!(health, 100);
                    break;
                }
                _ => continue,
            }
        }

        assert!(killed_at.elapsed() >= Duration::from_secs(3));
        assert_eq!(handle.stats().players(), 2);
        assert_eq!(handle.stats().rooms(), 1);
    }

    #[tokio::test]
    async fn disconnect_cancels_the_pending_respawn() {
        let connections = Arc::new(Connections::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let (mut arena, handle) = GameArena::new(&config(), connections);
        arena.process(join(a, "A"));
        arena.process(join(b, "B"));
        arena.process(kill(b, a));
        assert_eq!(arena.pending_respawns(), 1);

        arena.process(ArenaEvent::Disconnected { player_id: a });
        assert_eq!(arena.pending_respawns(), 0);
        assert_eq!(handle.stats().players(), 1);
    }

    #[tokio::test]
    async fn superseded_timers_are_ignored() {
        let connections = Arc::new(Connections::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = connections.register(a);

        let (mut arena, _handle) = GameArena::new(&config(), connections);
        arena.process(join(a, "A"));
        arena.process(join(b, "B"));
        arena.process(kill(b, a));

        arena.process(ArenaEvent::RespawnDue {
            player_id: a,
            timer_id: 999,
        });
        assert_eq!(arena.pending_respawns(), 1);

        while let Ok(msg) = rx_a.try_recv() {
            assert!(!matches!(msg, ServerMsg::Respawn { .. }));
        }
    }
}
