use chrono::{DateTime, Utc};

/// A stored user credential
///
/// The username keeps the casing entered at signup; the repository keys
/// entries by the lowercased form.
#[derive(Debug, Clone)]
pub struct UserModel {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
