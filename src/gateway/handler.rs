use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::messages::ClientMessage;
use crate::room::service::RoomService;
use crate::shared::AppState;

use super::socket::{Connection, MessageHandler};

/// Routes parsed client events to the room service
pub struct EventRouter {
    room_service: Arc<RoomService>,
}

impl EventRouter {
    pub fn new(room_service: Arc<RoomService>) -> Self {
        Self { room_service }
    }
}

#[async_trait]
impl MessageHandler for EventRouter {
    async fn handle_message(&self, session_id: Uuid, message: String) {
        debug!(
            session_id = %session_id,
            message = %message,
            "Received message"
        );

        match serde_json::from_str::<ClientMessage>(&message) {
            Ok(ClientMessage::JoinRoom(payload)) => {
                self.room_service
                    .join(session_id, &payload.room_id, &payload.username);
            }
            Ok(ClientMessage::RollDice(payload)) => {
                self.room_service.submit_roll(
                    &payload.room_id,
                    &payload.username,
                    &payload.dice_type,
                    payload.result,
                );
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
            }
        }
    }
}

/// WebSocket endpoint for the realtime dice protocol
/// GET /ws - no authentication required, clients identify themselves via join-room
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    let session_id = Uuid::new_v4();
    info!(
        session_id = %session_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    // Register connection with the connection manager
    app_state
        .connection_manager
        .register(session_id, outbound_sender);

    let message_handler = Arc::new(EventRouter::new(app_state.room_service.clone()));

    // Create and run the connection until disconnect
    let connection = Connection::new(
        session_id,
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(
                session_id = %session_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                session_id = %session_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: leave the current room, then drop the connection
    app_state.room_service.leave(session_id);
    app_state.connection_manager.unregister(session_id);
}
