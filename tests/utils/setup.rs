use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use rolltable::gateway::{
    ConnectionManager, EventRouter, InMemoryConnectionManager, MessageHandler, ServerMessage,
};
use rolltable::room::RoomService;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A fake client connection: registered with the connection manager and
/// holding the receiving end of its outbound channel.
pub struct TestSession {
    pub id: Uuid,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl TestSession {
    /// Drain and parse everything delivered to this session so far
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(json) = self.receiver.try_recv() {
            messages.push(serde_json::from_str(&json).unwrap());
        }
        messages
    }

    /// Discard everything delivered so far
    pub fn clear(&mut self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

pub struct TestSetup {
    pub connection_manager: Arc<InMemoryConnectionManager>,
    pub room_service: Arc<RoomService>,
    router: EventRouter,
}

impl TestSetup {
    pub fn new() -> Self {
        let connection_manager = Arc::new(InMemoryConnectionManager::new());
        let room_service = Arc::new(RoomService::new(connection_manager.clone()));
        let router = EventRouter::new(room_service.clone());
        Self {
            connection_manager,
            room_service,
            router,
        }
    }

    pub fn connect(&self) -> TestSession {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.connection_manager.register(id, sender);
        TestSession { id, receiver }
    }

    /// Send a join-room event through the router, as a client would
    pub async fn join(&self, session: &TestSession, room_id: &str, username: &str) {
        let message = serde_json::json!({
            "event": "join-room",
            "data": { "roomId": room_id, "username": username }
        });
        self.router
            .handle_message(session.id, message.to_string())
            .await;
    }

    /// Send a roll-dice event through the router, as a client would
    pub async fn roll(
        &self,
        session: &TestSession,
        room_id: &str,
        username: &str,
        dice_type: &str,
        result: i32,
    ) {
        let message = serde_json::json!({
            "event": "roll-dice",
            "data": {
                "roomId": room_id,
                "username": username,
                "diceType": dice_type,
                "result": result
            }
        });
        self.router
            .handle_message(session.id, message.to_string())
            .await;
    }

    /// Tear a session down in gateway order: leave the room, then drop the connection
    pub fn disconnect(&self, session: &TestSession) {
        self.room_service.leave(session.id);
        self.connection_manager.unregister(session.id);
    }
}

impl Default for TestSetup {
    fn default() -> Self {
        Self::new()
    }
}
