use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::UserModel;
use super::password::{hash_password, verify_password};
use super::repository::{InsertUserResult, UserRepository};
use super::token::TokenConfig;
use super::types::{AuthClaims, AuthResponse, CredentialRequest};
use crate::shared::AppError;

/// Minimum accepted password length at signup
const MIN_PASSWORD_LEN: usize = 6;

/// Service for signup, login and token issuance
pub struct AuthService {
    repository: Arc<dyn UserRepository>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(repository: Arc<dyn UserRepository>, token_config: TokenConfig) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    /// Registers a new user and returns a token for the fresh account
    ///
    /// Rejections, in order: missing fields, username taken, password too
    /// short.
    #[instrument(skip(self, request))]
    pub async fn signup(&self, request: CredentialRequest) -> Result<AuthResponse, AppError> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password required".to_string(),
            ));
        }

        if self.repository.find(&request.username).await?.is_some() {
            warn!(username = %request.username, "Signup rejected, username taken");
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        // Length in UTF-16 code units, not bytes
        if request.password.encode_utf16().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let user = UserModel::new(request.username.clone(), password_hash);

        if let InsertUserResult::UsernameTaken = self.repository.try_insert(user).await? {
            // Lost a race against a concurrent signup for the same name
            warn!(username = %request.username, "Signup rejected, username taken");
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        let token = self.token_config.create_token(request.username.clone())?;

        info!(username = %request.username, "User registered");
        Ok(AuthResponse {
            token,
            username: request.username,
        })
    }

    /// Verifies a credential and returns a fresh token
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller. The response carries the casing the user signed up with.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: CredentialRequest) -> Result<AuthResponse, AppError> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password required".to_string(),
            ));
        }

        let user = match self.repository.find(&request.username).await? {
            Some(user) => user,
            None => {
                warn!(username = %request.username, "Login failed, unknown username");
                return Err(AppError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        if !verify_password(&request.password, &user.password_hash) {
            warn!(username = %user.username, "Login failed, wrong password");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.token_config.create_token(user.username.clone())?;

        info!(username = %user.username, "User logged in");
        Ok(AuthResponse {
            token,
            username: user.username,
        })
    }

    /// Validates a previously issued token
    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, AppError> {
        self.token_config.validate_token(token)
    }
}
