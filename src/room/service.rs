use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{RollRecord, Room};
use crate::gateway::connection_manager::ConnectionManager;
use crate::gateway::messages::ServerMessage;

/// Room registry and roll dispatcher
///
/// Rooms are created on first join and removed when the last member
/// leaves, so an existing room always has at least one member. Uses
/// `DashMap` for shard-level concurrency across rooms and a
/// `parking_lot::Mutex` per room so that mutating a room and fanning the
/// change out happen under one lock; broadcasts within a room are never
/// reordered and independent rooms never wait on each other.
pub struct RoomService {
    rooms: DashMap<String, Mutex<Room>>,
    connections: Arc<dyn ConnectionManager>,
}

impl RoomService {
    pub fn new(connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            rooms: DashMap::new(),
            connections,
        }
    }

    /// Attaches a session to a room, creating the room if needed
    ///
    /// A session still joined to a different room leaves it first, with
    /// the usual departure side effects. Everyone in the target room,
    /// the joiner included, receives the updated member list; the joiner
    /// alone then receives the room's recent roll history.
    #[instrument(skip(self))]
    pub fn join(&self, session_id: Uuid, room_id: &str, username: &str) {
        if let Some(current) = self.connections.current_room(session_id) {
            if current != room_id {
                self.leave(session_id);
            }
        }

        let entry = self.rooms.entry(room_id.to_string()).or_default();
        let mut room = entry.lock();
        // Bind under the room lock; a roll submitted concurrently must land
        // either in the replay below or in a later live broadcast, never both
        self.connections
            .bind_room(session_id, username.to_string(), room_id.to_string());
        room.add_member(username);

        info!(
            room_id = %room_id,
            username = %username,
            member_count = room.members.len(),
            "Member joined room"
        );

        self.connections.broadcast_to_room(
            room_id,
            &ServerMessage::user_joined(username.to_string(), room.members.clone()),
        );
        self.connections.send_to_session(
            session_id,
            &ServerMessage::RollHistory(room.recent_history()),
        );
    }

    /// Detaches a session from its current room, if any
    ///
    /// Removes the member, deletes the room once its member list empties
    /// and otherwise tells the remaining members who left. Calling this
    /// for a session with no room binding is a no-op, so disconnect
    /// cleanup can run more than once.
    #[instrument(skip(self))]
    pub fn leave(&self, session_id: Uuid) {
        let (username, room_id) = match self.connections.take_room(session_id) {
            Some(binding) => binding,
            None => return,
        };

        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(occupied) => {
                let mut room = occupied.get().lock();
                room.remove_member(&username);

                if room.members.is_empty() {
                    drop(room);
                    occupied.remove();
                    info!(
                        room_id = %room_id,
                        username = %username,
                        "Last member left, room removed"
                    );
                } else {
                    info!(
                        room_id = %room_id,
                        username = %username,
                        member_count = room.members.len(),
                        "Member left room"
                    );
                    self.connections.broadcast_to_room(
                        &room_id,
                        &ServerMessage::user_left(username.clone(), room.members.clone()),
                    );
                }
            }
            Entry::Vacant(_) => {
                // The room can be gone already when two sessions shared a name
                debug!(room_id = %room_id, "Session was bound to a missing room");
            }
        }
    }

    /// Records a roll and broadcasts it to the room's members
    ///
    /// Rolls aimed at a room that does not exist are dropped silently;
    /// the sender is not required to be a member.
    #[instrument(skip(self))]
    pub fn submit_roll(&self, room_id: &str, username: &str, dice_type: &str, result: i32) {
        let entry = match self.rooms.get(room_id) {
            Some(entry) => entry,
            None => {
                debug!(room_id = %room_id, "Dropping roll for unknown room");
                return;
            }
        };

        let mut room = entry.lock();
        let record = RollRecord {
            username: username.to_string(),
            dice_type: dice_type.to_string(),
            result,
            timestamp: Utc::now(),
        };
        room.record_roll(record.clone());

        debug!(
            room_id = %room_id,
            username = %username,
            dice_type = %dice_type,
            result = result,
            "Roll recorded"
        );

        self.connections
            .broadcast_to_room(room_id, &ServerMessage::DiceRolled(record));
    }

    /// True if the room currently exists
    pub fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Current member list of a room, if it exists
    pub fn members(&self, room_id: &str) -> Option<Vec<String>> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.lock().members.clone())
    }

    /// Number of retained rolls for a room, if it exists
    pub fn history_len(&self, room_id: &str) -> Option<usize> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.lock().history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::connection_manager::InMemoryConnectionManager;
    use crate::gateway::messages::MembershipPayload;
    use tokio::sync::mpsc;

    struct Harness {
        connections: Arc<InMemoryConnectionManager>,
        service: RoomService,
    }

    impl Harness {
        fn new() -> Self {
            let connections = Arc::new(InMemoryConnectionManager::new());
            let service = RoomService::new(connections.clone());
            Self {
                connections,
                service,
            }
        }

        fn connect(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
            let session_id = Uuid::new_v4();
            let (sender, receiver) = mpsc::unbounded_channel();
            self.connections.register(session_id, sender);
            (session_id, receiver)
        }
    }

    fn drain(receiver: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(raw) = receiver.try_recv() {
            messages.push(serde_json::from_str(&raw).unwrap());
        }
        messages
    }

    #[test]
    fn test_join_creates_room_and_replays_history() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();

        assert!(!harness.service.room_exists("table1"));
        harness.service.join(alice, "table1", "alice");

        assert!(harness.service.room_exists("table1"));
        assert_eq!(
            harness.service.members("table1"),
            Some(vec!["alice".to_string()])
        );

        let messages = drain(&mut alice_rx);
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            ServerMessage::UserJoined(MembershipPayload {
                username: "alice".to_string(),
                users: vec!["alice".to_string()],
            })
        );
        assert_eq!(messages[1], ServerMessage::RollHistory(vec![]));
    }

    #[test]
    fn test_join_notifies_existing_members() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();
        let (bob, mut bob_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        drain(&mut alice_rx);

        harness.service.join(bob, "table1", "bob");

        let alice_messages = drain(&mut alice_rx);
        assert_eq!(
            alice_messages,
            vec![ServerMessage::user_joined(
                "bob".to_string(),
                vec!["alice".to_string(), "bob".to_string()],
            )]
        );

        // The joiner additionally gets the history replay
        let bob_messages = drain(&mut bob_rx);
        assert_eq!(bob_messages.len(), 2);
        assert!(matches!(bob_messages[1], ServerMessage::RollHistory(_)));
    }

    #[test]
    fn test_rejoining_same_room_is_idempotent() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        drain(&mut alice_rx);

        harness.service.join(alice, "table1", "alice");

        assert_eq!(
            harness.service.members("table1"),
            Some(vec!["alice".to_string()])
        );

        // The membership broadcast and a fresh replay still go out
        let messages = drain(&mut alice_rx);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], ServerMessage::RollHistory(_)));
    }

    #[test]
    fn test_switching_rooms_leaves_the_previous_one() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();
        let (bob, mut bob_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        harness.service.join(bob, "table1", "bob");
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        harness.service.join(alice, "table2", "alice");

        assert_eq!(
            harness.service.members("table1"),
            Some(vec!["bob".to_string()])
        );
        assert_eq!(
            harness.service.members("table2"),
            Some(vec!["alice".to_string()])
        );

        let bob_messages = drain(&mut bob_rx);
        assert_eq!(
            bob_messages,
            vec![ServerMessage::user_left(
                "alice".to_string(),
                vec!["bob".to_string()],
            )]
        );
    }

    #[test]
    fn test_leaving_last_member_removes_room() {
        let harness = Harness::new();
        let (alice, _alice_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        harness.service.leave(alice);

        assert!(!harness.service.room_exists("table1"));
    }

    #[test]
    fn test_leave_without_room_is_noop() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();

        harness.service.leave(alice);
        harness.service.leave(alice);

        assert!(drain(&mut alice_rx).is_empty());
    }

    #[test]
    fn test_roll_for_unknown_room_is_dropped() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        drain(&mut alice_rx);

        harness.service.submit_roll("ghost", "alice", "d20", 17);

        assert!(!harness.service.room_exists("ghost"));
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[test]
    fn test_roll_is_recorded_and_broadcast() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();
        let (bob, mut bob_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        harness.service.join(bob, "table1", "bob");
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        harness.service.submit_roll("table1", "alice", "d20", 17);

        assert_eq!(harness.service.history_len("table1"), Some(1));

        for receiver in [&mut alice_rx, &mut bob_rx] {
            let messages = drain(receiver);
            assert_eq!(messages.len(), 1);
            match &messages[0] {
                ServerMessage::DiceRolled(record) => {
                    assert_eq!(record.username, "alice");
                    assert_eq!(record.dice_type, "d20");
                    assert_eq!(record.result, 17);
                }
                other => panic!("expected a roll broadcast, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_rolls_do_not_cross_rooms() {
        let harness = Harness::new();
        let (alice, mut alice_rx) = harness.connect();
        let (bob, mut bob_rx) = harness.connect();

        harness.service.join(alice, "table1", "alice");
        harness.service.join(bob, "table2", "bob");
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        harness.service.submit_roll("table1", "alice", "d6", 4);

        assert_eq!(drain(&mut alice_rx).len(), 1);
        assert!(drain(&mut bob_rx).is_empty());
        assert_eq!(harness.service.history_len("table2"), Some(0));
    }

    #[test]
    fn test_join_replay_and_live_broadcasts_do_not_overlap() {
        let harness = Harness::new();
        let (roller, _roller_rx) = harness.connect();
        harness.service.join(roller, "table1", "alice");

        let Harness {
            connections,
            service,
        } = harness;
        let service = Arc::new(service);

        let writer = {
            let service = service.clone();
            std::thread::spawn(move || {
                for result in 1..=200 {
                    service.submit_roll("table1", "alice", "d20", result);
                }
            })
        };

        let joiner = Uuid::new_v4();
        let (sender, mut joiner_rx) = mpsc::unbounded_channel();
        connections.register(joiner, sender);
        service.join(joiner, "table1", "bob");

        writer.join().unwrap();

        // Each roll reaches the late joiner at most once, in the replay or
        // as a live broadcast
        let mut seen = std::collections::HashSet::new();
        while let Ok(raw) = joiner_rx.try_recv() {
            match serde_json::from_str::<ServerMessage>(&raw).unwrap() {
                ServerMessage::RollHistory(records) => {
                    for record in records {
                        assert!(seen.insert(record.result), "saw roll {} twice", record.result);
                    }
                }
                ServerMessage::DiceRolled(record) => {
                    assert!(seen.insert(record.result), "saw roll {} twice", record.result);
                }
                _ => {}
            }
        }
        assert!(!seen.is_empty());
    }
}
