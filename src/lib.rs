// Library crate for the dice room server
// This file exposes the public API for integration tests

pub mod auth;
pub mod gateway;
pub mod room;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use auth::{AuthService, TokenConfig};
pub use gateway::{ClientMessage, ConnectionManager, InMemoryConnectionManager, ServerMessage};
pub use room::{RollRecord, RoomService};
pub use shared::AppError;
