//! Room registry: pairings and their round state

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::round::RoundState;
use crate::ws::transport::ConnectionId;

/// Room identifier, allocated from a counter and never reused
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

/// One active pairing
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    /// Waiting player first, arriving player second
    pub members: [Member; 2],
    pub round: RoundState,
}

impl Room {
    pub fn is_member(&self, connection_id: ConnectionId) -> bool {
        self.members.iter().any(|m| m.connection_id == connection_id)
    }

    pub fn member(&self, connection_id: ConnectionId) -> Option<&Member> {
        self.members.iter().find(|m| m.connection_id == connection_id)
    }

    /// The member that is not `connection_id`
    pub fn opponent_of(&self, connection_id: ConnectionId) -> Option<&Member> {
        if !self.is_member(connection_id) {
            return None;
        }
        self.members.iter().find(|m| m.connection_id != connection_id)
    }

    /// Member id -> display name
    pub fn players(&self) -> BTreeMap<ConnectionId, String> {
        self.members
            .iter()
            .map(|m| (m.connection_id, m.display_name.clone()))
            .collect()
    }

    pub fn member_ids(&self) -> [ConnectionId; 2] {
        [self.members[0].connection_id, self.members[1].connection_id]
    }
}

/// Registry of all live rooms
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    /// Member connection -> its room
    by_connection: HashMap<ConnectionId, RoomId>,
    next_id: u64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room for two connections that are in no other room
    pub fn create(&mut self, first: Member, second: Member) -> RoomId {
        debug_assert!(first.connection_id != second.connection_id);
        debug_assert!(!self.by_connection.contains_key(&first.connection_id));
        debug_assert!(!self.by_connection.contains_key(&second.connection_id));

        self.next_id += 1;
        let id = RoomId(format!("room-{}", self.next_id));

        self.by_connection.insert(first.connection_id, id.clone());
        self.by_connection.insert(second.connection_id, id.clone());
        self.rooms.insert(
            id.clone(),
            Room {
                id: id.clone(),
                members: [first, second],
                round: RoundState::new(),
            },
        );

        id
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    /// Room a connection belongs to
    pub fn find_room_by_connection(&self, connection_id: ConnectionId) -> Option<&Room> {
        self.by_connection
            .get(&connection_id)
            .and_then(|id| self.rooms.get(id))
    }

    /// Remove a room and all of its indexes
    pub fn destroy(&mut self, id: &RoomId) -> Option<Room> {
        let room = self.rooms.remove(id)?;
        for member in &room.members {
            self.by_connection.remove(&member.connection_id);
        }
        Some(room)
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }
}
