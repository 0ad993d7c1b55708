// Public API - what other modules can use
pub use handlers::{login, signup};
pub use service::AuthService;
pub use token::TokenConfig;
pub use types::AuthClaims;

// Internal modules
mod handlers;
pub mod models;
mod password;
pub mod repository;
pub mod service;
mod token;
pub mod types;
