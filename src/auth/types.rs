use serde::{Deserialize, Serialize};

/// JWT claims issued at signup and login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthClaims {
    pub username: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Request body shared by the signup and login endpoints
///
/// Missing fields deserialize as empty strings so the service can reply
/// with its own validation message instead of a generic rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response body for successful signup and login
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
}
