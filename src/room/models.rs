use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of roll records a room retains
pub const HISTORY_CAPACITY: usize = 50;

/// Maximum number of records replayed to a joining member
pub const HISTORY_REPLAY_LIMIT: usize = 20;

/// A single dice roll, immutable once recorded
///
/// The timestamp is assigned by the server at receipt and crosses the
/// wire as epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RollRecord {
    pub username: String,
    pub dice_type: String,
    pub result: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// In-memory state of a single room
#[derive(Debug, Default)]
pub struct Room {
    /// Member display names in join order
    pub members: Vec<String>,
    /// Retained rolls, oldest first
    pub history: VecDeque<RollRecord>,
}

impl Room {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            history: VecDeque::new(),
        }
    }

    /// Check if a member with this display name is present
    pub fn has_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    /// Add a member unless the name is already present
    pub fn add_member(&mut self, username: &str) {
        if !self.has_member(username) {
            self.members.push(username.to_string());
        }
    }

    /// Remove a member by display name
    pub fn remove_member(&mut self, username: &str) {
        self.members.retain(|m| m != username);
    }

    /// Appends a record, evicting the oldest once past capacity
    pub fn record_roll(&mut self, record: RollRecord) {
        self.history.push_back(record);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
    }

    /// The most recent records, oldest first, capped at the replay limit
    pub fn recent_history(&self) -> Vec<RollRecord> {
        let skip = self.history.len().saturating_sub(HISTORY_REPLAY_LIMIT);
        self.history.iter().skip(skip).cloned().collect()
    }
}
