use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::database::models::Recommendation;
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRecommendationRequest {
    pub user_id: i64,
    pub content_id: i64,
}

/// POST /api/recommendations - Admin only
///
/// Both keys must resolve; a dangling user or navigation id is reported as 404.
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateRecommendationRequest>,
) -> ApiResult<Recommendation> {
    if !user.is_admin() {
        tracing::warn!("User {} attempted to create a recommendation without admin role", user.id);
        return Err(ApiError::forbidden("Not enough permissions"));
    }

    if state.repo.find_user_by_id(payload.user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if state.repo.find_navigation(payload.content_id).await?.is_none() {
        return Err(ApiError::not_found("Navigation not found"));
    }

    let recommendation = state
        .repo
        .create_recommendation(payload.user_id, payload.content_id)
        .await?;

    tracing::info!(
        "Recommended navigation {} to user {}",
        recommendation.content_id,
        recommendation.user_id
    );
    Ok(Json(recommendation))
}
