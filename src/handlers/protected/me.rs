use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::auth::validate::{validate_email_format, validate_password, validate_username_format};
use crate::database::models::{ActionLog, RecommendedContent, UserChanges, UserResponse};
use crate::database::PageParams;
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Profile patch; absent and `null` fields are both left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// GET /api/me
pub async fn read(Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<UserResponse> {
    Ok(Json(user.into()))
}

/// PUT /api/me - Update the caller's email, username or password
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(payload): ApiJson<UpdateMeRequest>,
) -> ApiResult<UserResponse> {
    let mut changes = UserChanges::default();

    if let Some(email) = payload.email.filter(|email| *email != user.email) {
        validate_email_format(&email).map_err(|msg| ApiError::invalid_field("email", msg))?;
        if state.repo.find_user_by_email(&email).await?.is_some() {
            return Err(ApiError::conflict("Email already registered"));
        }
        changes.email = Some(email);
    }

    if let Some(username) = payload.username.filter(|username| *username != user.username) {
        validate_username_format(&username).map_err(|msg| ApiError::invalid_field("username", msg))?;
        if state.repo.find_user_by_username(&username).await?.is_some() {
            return Err(ApiError::conflict("Username already taken"));
        }
        changes.username = Some(username);
    }

    if let Some(password) = payload.password {
        validate_password(&password).map_err(|msg| ApiError::invalid_field("password", msg))?;
        changes.password_hash = Some(state.credentials.hash(password).await?);
    }

    if changes.is_empty() {
        return Ok(Json(user.into()));
    }

    let updated = state.repo.update_user(user.id, changes).await?;
    state.audit(updated.id, "update_profile").await;

    Ok(Json(updated.into()))
}

/// GET /api/me/activity - The caller's audit trail, newest first
pub async fn activity(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Vec<ActionLog>> {
    let entries = state.repo.list_action_logs_by_user(user.id, state.page(page)).await?;
    Ok(Json(entries))
}

/// GET /api/me/recommendations - Navigation items recommended to the caller
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Vec<RecommendedContent>> {
    let items = state.repo.list_recommendations_by_user(user.id, state.page(page)).await?;
    Ok(Json(items))
}
