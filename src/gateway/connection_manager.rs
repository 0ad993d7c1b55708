use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::gateway::messages::ServerMessage;

/// Per-session connection state
struct SessionEntry {
    sender: mpsc::UnboundedSender<String>,
    username: Option<String>,
    room_id: Option<String>,
}

/// Tracks live WebSocket sessions and their room bindings.
///
/// All methods are synchronous so callers can notify sessions while holding
/// a room lock. Sends go through unbounded channels and never block.
pub trait ConnectionManager: Send + Sync {
    fn register(&self, session_id: Uuid, sender: mpsc::UnboundedSender<String>);

    fn unregister(&self, session_id: Uuid);

    /// Room the session is currently bound to, if any
    fn current_room(&self, session_id: Uuid) -> Option<String>;

    /// Bind the session to a room under the given display name
    fn bind_room(&self, session_id: Uuid, username: String, room_id: String);

    /// Clear the session's binding, returning `(username, room_id)` if one was set
    fn take_room(&self, session_id: Uuid) -> Option<(String, String)>;

    fn send_to_session(&self, session_id: Uuid, message: &ServerMessage);

    fn broadcast_to_room(&self, room_id: &str, message: &ServerMessage);
}

pub struct InMemoryConnectionManager {
    // session id -> connection state
    sessions: DashMap<Uuid, Mutex<SessionEntry>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager for InMemoryConnectionManager {
    fn register(&self, session_id: Uuid, sender: mpsc::UnboundedSender<String>) {
        self.sessions.insert(
            session_id,
            Mutex::new(SessionEntry {
                sender,
                username: None,
                room_id: None,
            }),
        );
    }

    fn unregister(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    fn current_room(&self, session_id: Uuid) -> Option<String> {
        let entry = self.sessions.get(&session_id)?;
        let entry = entry.lock();
        entry.room_id.clone()
    }

    fn bind_room(&self, session_id: Uuid, username: String, room_id: String) {
        if let Some(entry) = self.sessions.get(&session_id) {
            let mut entry = entry.lock();
            entry.username = Some(username);
            entry.room_id = Some(room_id);
        }
    }

    fn take_room(&self, session_id: Uuid) -> Option<(String, String)> {
        let entry = self.sessions.get(&session_id)?;
        let mut entry = entry.lock();
        match (entry.username.take(), entry.room_id.take()) {
            (Some(username), Some(room_id)) => Some((username, room_id)),
            _ => None,
        }
    }

    fn send_to_session(&self, session_id: Uuid, message: &ServerMessage) {
        if let Ok(json) = serde_json::to_string(message) {
            if let Some(entry) = self.sessions.get(&session_id) {
                let entry = entry.lock();
                let _ = entry.sender.send(json);
            }
        }
    }

    fn broadcast_to_room(&self, room_id: &str, message: &ServerMessage) {
        if let Ok(json) = serde_json::to_string(message) {
            for entry in self.sessions.iter() {
                let entry = entry.lock();
                if entry.room_id.as_deref() == Some(room_id) {
                    let _ = entry.sender.send(json.clone());
                }
            }
        }
    }
}
