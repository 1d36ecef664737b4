use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Deserializer};

use crate::database::models::{Navigation, NavigationChanges, NewNavigation, User};
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNavigationRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Navigation patch. `description` and `url` distinguish an absent key
/// (unchanged) from an explicit `null` (cleared).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNavigationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Creator or admin
fn can_modify(user: &User, navigation: &Navigation) -> bool {
    user.is_admin() || navigation.created_by == user.id
}

/// Resolve the target and check ownership; absence wins over permission
async fn load_for_modification(state: &AppState, user: &User, id: i64) -> Result<Navigation, ApiError> {
    let navigation = state
        .repo
        .find_navigation(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Navigation not found"))?;

    if !can_modify(user, &navigation) {
        tracing::warn!("User {} denied modification of navigation {}", user.id, id);
        return Err(ApiError::forbidden("Not enough permissions"));
    }
    Ok(navigation)
}

/// POST /api/navigation/
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateNavigationRequest>,
) -> ApiResult<Navigation> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "Title cannot be empty"));
    }

    let navigation = state
        .repo
        .create_navigation(NewNavigation {
            title: payload.title,
            description: payload.description,
            url: payload.url,
            created_by: user.id,
        })
        .await?;

    state.audit(user.id, "navigation_create").await;
    Ok(Json(navigation))
}

/// PUT /api/navigation/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateNavigationRequest>,
) -> ApiResult<Navigation> {
    let current = load_for_modification(&state, &user, id).await?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::invalid_field("title", "Title cannot be empty"));
        }
    }

    let changes = NavigationChanges {
        title: payload.title,
        description: payload.description,
        url: payload.url,
    };
    if changes.title.is_none() && changes.description.is_none() && changes.url.is_none() {
        return Ok(Json(current));
    }

    let navigation = state.repo.update_navigation(id, changes).await?;
    state.audit(user.id, "navigation_update").await;
    Ok(Json(navigation))
}

/// DELETE /api/navigation/:id - Also drops recommendations pointing at the item
pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    load_for_modification(&state, &user, id).await?;

    if !state.repo.delete_navigation(id).await? {
        return Err(ApiError::not_found("Navigation not found"));
    }

    state.audit(user.id, "navigation_delete").await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ROLE_ADMIN, ROLE_USER};
    use chrono::Utc;

    fn user(id: i64, role: &str) -> User {
        User {
            id,
            email: format!("u{}@example.com", id),
            username: format!("u{}", id),
            password_hash: String::new(),
            role: role.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn nav(created_by: i64) -> Navigation {
        Navigation {
            id: 1,
            title: "Breathing".to_string(),
            description: None,
            url: None,
            created_by,
        }
    }

    #[test]
    fn creator_and_admin_may_modify() {
        assert!(can_modify(&user(1, ROLE_USER), &nav(1)));
        assert!(can_modify(&user(2, ROLE_ADMIN), &nav(1)));
        assert!(!can_modify(&user(2, ROLE_USER), &nav(1)));
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let absent: UpdateNavigationRequest = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert_eq!(absent.description, None);
        assert_eq!(absent.url, None);

        let cleared: UpdateNavigationRequest =
            serde_json::from_str(r#"{"description":null,"url":"https://x.org"}"#).unwrap();
        assert_eq!(cleared.title, None);
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.url, Some(Some("https://x.org".to_string())));
    }
}
