//! Outbound channels for every open socket

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::game::PlayerId;
use crate::ws::protocol::ServerMsg;

/// Messages buffered per connection before deliveries are dropped
pub const OUTBOUND_CAPACITY: usize = 256;

/// Registry of per-connection outbound queues
#[derive(Default)]
pub struct Connections {
    senders: DashMap<PlayerId, mpsc::Sender<ServerMsg>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbound queue for a connection, returning its receiving end
    pub fn register(&self, player_id: PlayerId) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.senders.insert(player_id, tx);
        rx
    }

    pub fn unregister(&self, player_id: &PlayerId) {
        self.senders.remove(player_id);
    }

    /// Best-effort delivery. Never waits on a slow client.
    pub fn deliver(&self, to: PlayerId, msg: ServerMsg) -> bool {
        let Some(sender) = self.senders.get(&to) else {
            return false;
        };

        match sender.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(player_id = %to, "Outbound queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(player_id = %to, "Outbound queue closed");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn delivers_to_registered_connections_only() {
        let connections = Connections::new();
        let id = Uuid::new_v4();
        let mut rx = connections.register(id);

        assert!(connections.deliver(id, ServerMsg::PlayerCountUpdate(2)));
        assert_eq!(rx.try_recv().unwrap(), ServerMsg::PlayerCountUpdate(2));

        assert!(!connections.deliver(Uuid::new_v4(), ServerMsg::PlayerCountUpdate(2)));

        connections.unregister(&id);
        assert_eq!(connections.len(), 0);
        assert!(!connections.deliver(id, ServerMsg::PlayerCountUpdate(1)));
    }

    #[test]
    fn full_queues_drop_instead_of_blocking() {
        let connections = Connections::new();
        let id = Uuid::new_v4();
        let _rx = connections.register(id);

        for _ in 0..OUTBOUND_CAPACITY {
            assert!(connections.deliver(id, ServerMsg::PlayerCountUpdate(1)));
        }
        assert!(!connections.deliver(id, ServerMsg::PlayerCountUpdate(1)));
    }
}
