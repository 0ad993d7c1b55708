use serde::{Deserialize, Serialize};

use crate::room::RollRecord;

/// Client-to-Server events
///
/// Messages arrive as JSON text frames shaped as `{"event": ..., "data": ...}`.
/// Unknown event names fail deserialization and are dropped by the router.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom(JoinRoomPayload),
    RollDice(RollDicePayload),
}

/// Server-to-Client events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    UserJoined(MembershipPayload),
    UserLeft(MembershipPayload),
    /// Recent rolls for the joining client, oldest first
    RollHistory(Vec<RollRecord>),
    DiceRolled(RollRecord),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RollDicePayload {
    pub room_id: String,
    pub username: String,
    pub dice_type: String,
    pub result: i32,
}

/// Membership change notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipPayload {
    /// The member who joined or left
    pub username: String,
    /// Full member list of the room after the change
    pub users: Vec<String>,
}

/// Helper functions for creating messages
impl ServerMessage {
    /// Create a user-joined message
    pub fn user_joined(username: String, users: Vec<String>) -> Self {
        Self::UserJoined(MembershipPayload { username, users })
    }

    /// Create a user-left message
    pub fn user_left(username: String, users: Vec<String>) -> Self {
        Self::UserLeft(MembershipPayload { username, users })
    }
}
