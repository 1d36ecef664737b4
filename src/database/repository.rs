use async_trait::async_trait;
use serde::Deserialize;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ActionLog, ChatLog, NavigationChanges, NewChatLog, NewNavigation, NewUser, Navigation,
    Recommendation, RecommendedContent, User, UserChanges,
};

/// Offset pagination as requested on list endpoints (`?skip=&limit=`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Fill in defaults, then clamp to non-negative values and the page-size cap
    pub fn resolve(self, default_limit: i64, max_limit: i64) -> Page {
        Page {
            skip: self.skip.unwrap_or(0).max(0),
            limit: self.limit.unwrap_or(default_limit).clamp(0, max_limit),
        }
    }
}

/// Resolved offset window handed to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn skip_usize(&self) -> usize {
        usize::try_from(self.skip).unwrap_or(0)
    }

    pub fn limit_usize(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(0)
    }
}

/// Persistence gateway over users, chat logs, navigation, audit logs and
/// recommendations.
///
/// Every method touches a single entity. Implementations enforce the
/// uniqueness and foreign-key invariants and report violations as
/// [`DatabaseError::Conflict`] and [`DatabaseError::NotFound`].
#[async_trait]
pub trait Repository: Send + Sync {
    // Users
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, DatabaseError>;
    async fn set_user_role(&self, id: i64, role: &str) -> Result<User, DatabaseError>;

    // Chat logs, always scoped to the owning user
    async fn create_chat_log(&self, new_log: NewChatLog) -> Result<ChatLog, DatabaseError>;
    async fn list_chat_logs_by_user(&self, user_id: i64, page: Page) -> Result<Vec<ChatLog>, DatabaseError>;
    async fn find_chat_log_for_user(&self, id: i64, user_id: i64) -> Result<Option<ChatLog>, DatabaseError>;
    /// Returns false when no row with that id belongs to the user
    async fn delete_chat_log_for_user(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError>;

    // Navigation
    async fn create_navigation(&self, new_nav: NewNavigation) -> Result<Navigation, DatabaseError>;
    async fn list_navigations(&self, page: Page) -> Result<Vec<Navigation>, DatabaseError>;
    async fn find_navigation(&self, id: i64) -> Result<Option<Navigation>, DatabaseError>;
    async fn update_navigation(&self, id: i64, changes: NavigationChanges) -> Result<Navigation, DatabaseError>;
    /// Also removes recommendations pointing at the item
    async fn delete_navigation(&self, id: i64) -> Result<bool, DatabaseError>;

    // Audit trail
    async fn append_action_log(&self, user_id: i64, action: &str) -> Result<ActionLog, DatabaseError>;
    async fn list_action_logs_by_user(&self, user_id: i64, page: Page) -> Result<Vec<ActionLog>, DatabaseError>;

    // Recommendations
    async fn create_recommendation(&self, user_id: i64, content_id: i64) -> Result<Recommendation, DatabaseError>;
    async fn list_recommendations_by_user(&self, user_id: i64, page: Page) -> Result<Vec<RecommendedContent>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_params_take_configured_default() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.resolve(100, 1000), Page { skip: 0, limit: 100 });
        assert_eq!(params.resolve(25, 1000), Page { skip: 0, limit: 25 });
    }

    #[test]
    fn resolve_bounds_skip_and_limit() {
        let page = PageParams { skip: Some(-5), limit: Some(5000) }.resolve(100, 1000);
        assert_eq!(page, Page { skip: 0, limit: 1000 });

        let page = PageParams { skip: Some(3), limit: Some(-1) }.resolve(100, 1000);
        assert_eq!(page, Page { skip: 3, limit: 0 });
    }
}
