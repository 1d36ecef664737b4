use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::validate::{validate_email_format, validate_password, validate_username_format};
use crate::auth::TOKEN_TYPE;
use crate::database::models::{NewUser, UserResponse};
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// POST /api/register - Create a new user account
///
/// Expected Input:
/// ```json
/// { "email": "a@x.com", "username": "a", "password": "p1" }
/// ```
///
/// Returns the public user projection. A taken email or username is
/// reported as `400 CONFLICT`.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<UserResponse> {
    validate_email_format(&payload.email).map_err(|msg| ApiError::invalid_field("email", msg))?;
    validate_username_format(&payload.username).map_err(|msg| ApiError::invalid_field("username", msg))?;
    validate_password(&payload.password).map_err(|msg| ApiError::invalid_field("password", msg))?;

    if state.repo.find_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }
    if state.repo.find_user_by_username(&payload.username).await?.is_some() {
        return Err(ApiError::conflict("Username already taken"));
    }

    let password_hash = state.credentials.hash(payload.password).await?;

    // The store re-checks uniqueness, so a concurrent registration still ends in Conflict
    let user = state
        .repo
        .create_user(NewUser {
            email: payload.email,
            username: payload.username,
            password_hash,
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.id, user.username);
    state.audit(user.id, "register").await;

    Ok(Json(user.into()))
}

/// POST /api/login - Exchange email and password for a bearer token
///
/// Expected Output:
/// ```json
/// { "access_token": "eyJhbGciOiJIUzI1NiI...", "token_type": "bearer", "expires_in": 691200 }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let rejected = || ApiError::unauthorized("Incorrect email or password");

    let Some(user) = state.repo.find_user_by_email(&payload.email).await? else {
        state.credentials.verify_decoy(payload.password).await;
        tracing::warn!("Login failed: unknown email");
        return Err(rejected());
    };

    if !state.credentials.verify(payload.password, user.password_hash.clone()).await {
        tracing::warn!("Login failed: wrong password for user {}", user.id);
        return Err(rejected());
    }

    if !user.is_active {
        tracing::warn!("Login failed: user {} is inactive", user.id);
        return Err(rejected());
    }

    let access_token = state.credentials.issue_access_token(user.id)?;
    state.audit(user.id, "login").await;

    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.credentials.token_ttl().num_seconds(),
    }))
}
