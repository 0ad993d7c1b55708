use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::types::{AuthResponse, CredentialRequest};
use crate::shared::{AppError, AppState};

/// HTTP handler for registering a new user
///
/// POST /api/signup
/// Returns a JWT token and the registered username
#[instrument(name = "signup", skip(state, request))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CredentialRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!(username = %request.username, "Signup requested");

    let response = state.auth_service.signup(request).await?;

    info!(username = %response.username, "Signup completed");
    Ok(Json(response))
}

/// HTTP handler for logging in an existing user
///
/// POST /api/login
/// Returns a fresh JWT token and the stored username
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!(username = %request.username, "Login requested");

    let response = state.auth_service.login(request).await?;

    info!(username = %response.username, "Login completed");
    Ok(Json(response))
}
