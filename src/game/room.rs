//! Room registry - ordered membership per room id

use std::collections::HashMap;

use super::PlayerId;

/// Result of removing a player from a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Player was not a member (or the room does not exist)
    NotMember,
    /// Player removed, room still has `remaining` members
    Left { remaining: usize },
    /// Player was the last member, room removed
    Closed,
}

/// Registry of rooms and their members.
///
/// Members keep join order, which is the tie order for rankings.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Vec<PlayerId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player to a room, creating it on first use. Returns the new member count.
    pub fn join(&mut self, room_id: &str, player_id: PlayerId) -> usize {
        let members = self.rooms.entry(room_id.to_string()).or_default();
        if !members.contains(&player_id) {
            members.push(player_id);
        }
        members.len()
    }

    /// Remove a player from a room. Empty rooms are dropped.
    pub fn leave(&mut self, room_id: &str, player_id: PlayerId) -> LeaveOutcome {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return LeaveOutcome::NotMember;
        };

        let Some(pos) = members.iter().position(|id| *id == player_id) else {
            return LeaveOutcome::NotMember;
        };
        members.remove(pos);

        if members.is_empty() {
            self.rooms.remove(room_id);
            LeaveOutcome::Closed
        } else {
            LeaveOutcome::Left {
                remaining: members.len(),
            }
        }
    }

    /// Members of a room in join order (empty if the room does not exist)
    pub fn members(&self, room_id: &str) -> &[PlayerId] {
        self.rooms.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn count(&self, room_id: &str) -> usize {
        self.members(room_id).len()
    }

    #[cfg(test)]
    pub fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    #[cfg(test)]
    pub fn is_member(&self, room_id: &str, player_id: &PlayerId) -> bool {
        self.members(room_id).contains(player_id)
    }

    /// Number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rooms_are_created_lazily_and_keep_join_order() {
        let mut rooms = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(!rooms.contains_room("default"));
        assert_eq!(rooms.join("default", a), 1);
        assert_eq!(rooms.join("default", b), 2);
        // joining twice is idempotent
        assert_eq!(rooms.join("default", a), 2);

        assert_eq!(rooms.members("default"), &[a, b]);
        assert!(rooms.is_member("default", &b));
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn last_member_leaving_closes_room() {
        let mut rooms = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        rooms.join("r1", a);
        rooms.join("r1", b);

        assert_eq!(rooms.leave("r1", a), LeaveOutcome::Left { remaining: 1 });
        assert_eq!(rooms.leave("r1", a), LeaveOutcome::NotMember);
        assert_eq!(rooms.leave("r1", b), LeaveOutcome::Closed);

        assert!(!rooms.contains_room("r1"));
        assert_eq!(rooms.len(), 0);
        assert!(rooms.members("r1").is_empty());
        assert_eq!(rooms.leave("missing", a), LeaveOutcome::NotMember);
    }
}
