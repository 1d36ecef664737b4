use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{ChatLog, NewChatLog};
use crate::database::PageParams;
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/chat/send - Store a message together with the generated reply
///
/// Expected Input:
/// ```json
/// { "message": "hi" }
/// ```
///
/// Expected Output:
/// ```json
/// { "id": 1, "user_id": 1, "message": "hi", "response": "这是对'hi'的自动回复", "timestamp": "..." }
/// ```
pub async fn send(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(payload): ApiJson<ChatRequest>,
) -> ApiResult<ChatLog> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::invalid_field("message", "Message cannot be empty"));
    }

    let response = state.responder.respond(&payload.message).await?;

    let log = state
        .repo
        .create_chat_log(NewChatLog {
            user_id: user.id,
            message: payload.message,
            response,
        })
        .await?;

    state.audit(user.id, "chat_send").await;
    Ok(Json(log))
}

/// GET /api/chat/history - The caller's conversation, newest first
pub async fn history(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Vec<ChatLog>> {
    let logs = state.repo.list_chat_logs_by_user(user.id, state.page(page)).await?;
    Ok(Json(logs))
}

/// GET /api/chat/history/:id
pub async fn detail(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ChatLog> {
    // Another user's row is indistinguishable from a missing one
    state
        .repo
        .find_chat_log_for_user(id, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Chat log not found"))
}

/// DELETE /api/chat/history/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.repo.delete_chat_log_for_user(id, user.id).await? {
        return Err(ApiError::not_found("Chat log not found"));
    }

    state.audit(user.id, "chat_delete").await;
    Ok(StatusCode::NO_CONTENT)
}
