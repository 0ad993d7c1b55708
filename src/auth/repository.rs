use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Result of attempting to register a new credential
#[derive(Debug, Clone)]
pub enum InsertUserResult {
    /// Credential stored successfully
    Inserted,
    /// The username is already registered
    UsernameTaken,
}

/// Trait for user credential storage
///
/// Usernames are compared case-insensitively; the stored model keeps the
/// casing from signup.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Atomically stores a credential unless the username is taken
    async fn try_insert(&self, user: UserModel) -> Result<InsertUserResult, AppError>;

    /// Looks up a credential by username
    async fn find(&self, username: &str) -> Result<Option<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository
///
/// Credentials are kept in a map keyed by lowercased username and are
/// lost when the application restarts.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of stored credentials
    pub fn user_count(&self) -> usize {
        self.users.lock().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn try_insert(&self, user: UserModel) -> Result<InsertUserResult, AppError> {
        let key = user.username.to_lowercase();

        let mut users = self.users.lock();
        if users.contains_key(&key) {
            warn!(username = %user.username, "Username already registered");
            return Ok(InsertUserResult::UsernameTaken);
        }

        debug!(username = %user.username, "Storing credential in memory");
        users.insert(key, user);

        Ok(InsertUserResult::Inserted)
    }

    #[instrument(skip(self))]
    async fn find(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock();
        let user = users.get(&username.to_lowercase()).cloned();

        match &user {
            Some(u) => debug!(username = %u.username, "Credential found in memory"),
            None => debug!(username = %username, "Credential not found in memory"),
        }

        Ok(user)
    }
}
