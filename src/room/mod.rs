// Public API - what other modules can use
pub use models::{RollRecord, Room, HISTORY_CAPACITY, HISTORY_REPLAY_LIMIT};
pub use service::RoomService;

// Internal modules
pub mod models;
pub mod service;
