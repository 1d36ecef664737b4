use axum::{extract::State, Json};

use crate::database::models::Navigation;
use crate::database::PageParams;
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

/// GET /api/navigation/ - List navigation items, oldest first (`?skip=&limit=`)
pub async fn list(State(state): State<AppState>, ApiQuery(page): ApiQuery<PageParams>) -> ApiResult<Vec<Navigation>> {
    let navigations = state.repo.list_navigations(state.page(page)).await?;
    Ok(Json(navigations))
}

/// GET /api/navigation/:id
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Navigation> {
    state
        .repo
        .find_navigation(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Navigation not found"))
}
