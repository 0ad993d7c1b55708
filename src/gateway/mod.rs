// Public API - what other modules can use
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, EventRouter};
pub use messages::{ClientMessage, ServerMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
pub mod connection_manager;
mod handler;
pub mod messages;
mod socket;
