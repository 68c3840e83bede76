//! Connection and room registry.
//!
//! One table of live connections plus two indexes over it: room to members and
//! user to connections. All three sit behind a single lock so a join, leave or
//! disconnect updates them together and a broadcast never sees a half-updated
//! member list. Sends only push onto unbounded queues, so the lock is never
//! held across an await.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::connection::{ConnectionHandle, ConnectionState, EventSender};
use super::events::ServerEvent;
use crate::domain::{ConnectionId, Identity, RoomId};

struct ConnectionEntry {
    identity: Identity,
    sender: EventSender,
    rooms: HashSet<RoomId>,
    state: ConnectionState,
}

#[derive(Default)]
struct Tables {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
    users: HashMap<i64, HashSet<ConnectionId>>,
}

impl Tables {
    fn deliver(&self, id: &ConnectionId, event: &Arc<ServerEvent>) -> bool {
        self.connections
            .get(id)
            .is_some_and(|entry| entry.sender.send(Arc::clone(event)).is_ok())
    }
}

/// A connection removed from the registry.
#[derive(Debug)]
pub struct Departed {
    pub identity: Identity,
    pub rooms: Vec<RoomId>,
}

#[derive(Default)]
pub struct Registry {
    tables: RwLock<Tables>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an authenticated connection.
    pub fn register(&self, identity: Identity) -> ConnectionHandle {
        let id = ConnectionId::new();
        let (sender, events) = mpsc::unbounded_channel();

        let mut tables = self.tables.write();
        tables.users.entry(identity.user_id).or_default().insert(id);
        tables.connections.insert(
            id,
            ConnectionEntry {
                identity,
                sender,
                rooms: HashSet::new(),
                state: ConnectionState::Authenticated,
            },
        );

        ConnectionHandle { id, events }
    }

    /// Remove a connection from every room and from the user index.
    ///
    /// Returns `None` if the connection was already gone, so concurrent close
    /// signals run the cleanup exactly once.
    pub fn unregister(&self, id: ConnectionId) -> Option<Departed> {
        let mut tables = self.tables.write();
        let entry = tables.connections.remove(&id)?;

        for room in &entry.rooms {
            if let Some(members) = tables.rooms.get_mut(room) {
                members.remove(&id);
                if members.is_empty() {
                    tables.rooms.remove(room);
                }
            }
        }

        if let Some(conns) = tables.users.get_mut(&entry.identity.user_id) {
            conns.remove(&id);
            if conns.is_empty() {
                tables.users.remove(&entry.identity.user_id);
            }
        }

        let mut rooms: Vec<RoomId> = entry.rooms.into_iter().collect();
        rooms.sort();

        Some(Departed {
            identity: entry.identity,
            rooms,
        })
    }

    /// Record that the connection accepted an event and return its identity.
    pub fn activate(&self, id: ConnectionId) -> Option<Identity> {
        let mut tables = self.tables.write();
        let entry = tables.connections.get_mut(&id)?;
        entry.state = entry.state.on_event();
        Some(entry.identity.clone())
    }

    pub fn state_of(&self, id: ConnectionId) -> ConnectionState {
        self.tables
            .read()
            .connections
            .get(&id)
            .map(|entry| entry.state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Add a connection to a room. Returns `Some(true)` if it was not already
    /// a member and `None` if the connection is gone.
    pub fn join(&self, id: ConnectionId, room: &RoomId) -> Option<bool> {
        let mut tables = self.tables.write();
        let entry = tables.connections.get_mut(&id)?;
        if !entry.rooms.insert(room.clone()) {
            return Some(false);
        }
        tables.rooms.entry(room.clone()).or_default().insert(id);
        Some(true)
    }

    /// Remove a connection from a room. Returns `Some(true)` if it was a member.
    pub fn leave(&self, id: ConnectionId, room: &RoomId) -> Option<bool> {
        let mut tables = self.tables.write();
        let entry = tables.connections.get_mut(&id)?;
        if !entry.rooms.remove(room) {
            return Some(false);
        }
        if let Some(members) = tables.rooms.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                tables.rooms.remove(room);
            }
        }
        Some(true)
    }

    /// Queue an event for one connection.
    pub fn send_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        self.tables.read().deliver(&id, &Arc::new(event))
    }

    /// Queue an event for every member of a room, optionally skipping one.
    pub fn broadcast_room(
        &self,
        room: &RoomId,
        event: ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let event = Arc::new(event);
        let tables = self.tables.read();
        let Some(members) = tables.rooms.get(room) else {
            return 0;
        };

        members
            .iter()
            .filter(|id| Some(**id) != except)
            .filter(|id| tables.deliver(id, &event))
            .count()
    }

    /// Queue an event for every live connection.
    pub fn broadcast_all(&self, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let tables = self.tables.read();
        tables
            .connections
            .values()
            .filter(|entry| entry.sender.send(Arc::clone(&event)).is_ok())
            .count()
    }

    /// Queue an event for every connection of one user.
    pub fn send_to_user(&self, user_id: i64, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let tables = self.tables.read();
        let Some(conns) = tables.users.get(&user_id) else {
            return 0;
        };

        conns.iter().filter(|id| tables.deliver(id, &event)).count()
    }

    pub fn members_of(&self, room: &RoomId) -> Vec<ConnectionId> {
        let mut members: Vec<_> = self
            .tables
            .read()
            .rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn rooms_of(&self, id: ConnectionId) -> Vec<RoomId> {
        let mut rooms: Vec<_> = self
            .tables
            .read()
            .connections
            .get(&id)
            .map(|entry| entry.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn user_connection_count(&self, user_id: i64) -> usize {
        self.tables
            .read()
            .users
            .get(&user_id)
            .map_or(0, HashSet::len)
    }

    pub fn connection_count(&self) -> usize {
        self.tables.read().connections.len()
    }

    pub fn room_count(&self) -> usize {
        self.tables.read().rooms.len()
    }
}
