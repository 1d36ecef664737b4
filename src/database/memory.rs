use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ActionLog, ChatLog, Navigation, NavigationChanges, NewChatLog, NewNavigation, NewUser,
    Recommendation, RecommendedContent, User, UserChanges, ROLE_USER,
};
use crate::database::repository::{Page, Repository};

/// In-process [`Repository`] used by tests and `--memory` development runs.
///
/// Mirrors the PostgreSQL schema: unique email/username, foreign keys to
/// users, and recommendations cascading away with their navigation item.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    chat_logs: BTreeMap<i64, ChatLog>,
    navigations: BTreeMap<i64, Navigation>,
    action_logs: BTreeMap<i64, ActionLog>,
    recommendations: BTreeMap<i64, Recommendation>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_user(&self, user_id: i64, what: &str) -> Result<(), DatabaseError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(format!("{} references a missing record", what)))
        }
    }

    fn check_unique(&self, email: Option<&str>, username: Option<&str>, except: Option<i64>) -> Result<(), DatabaseError> {
        let clash = self.users.values().any(|u| {
            Some(u.id) != except
                && (email == Some(u.email.as_str()) || username == Some(u.username.as_str()))
        });
        if clash {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }
        Ok(())
    }
}

fn paginate<T: Clone>(rows: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    rows.skip(page.skip_usize()).take(page.limit_usize()).collect()
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_unique(Some(&new_user.email), Some(&new_user.username), None)?;

        let user = User {
            id: tables.next_id(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            role: ROLE_USER.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_unique(changes.email.as_deref(), changes.username.as_deref(), Some(id))?;

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {}", id)))?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        Ok(user.clone())
    }

    async fn set_user_role(&self, id: i64, role: &str) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {}", id)))?;
        user.role = role.to_string();
        Ok(user.clone())
    }

    async fn create_chat_log(&self, new_log: NewChatLog) -> Result<ChatLog, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_log.user_id, "Chat log")?;

        let log = ChatLog {
            id: tables.next_id(),
            user_id: new_log.user_id,
            message: new_log.message,
            response: new_log.response,
            timestamp: Utc::now(),
        };
        tables.chat_logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn list_chat_logs_by_user(&self, user_id: i64, page: Page) -> Result<Vec<ChatLog>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut logs: Vec<&ChatLog> = tables.chat_logs.values().filter(|l| l.user_id == user_id).collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(paginate(logs.into_iter().cloned(), page))
    }

    async fn find_chat_log_for_user(&self, id: i64, user_id: i64) -> Result<Option<ChatLog>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.chat_logs.get(&id).filter(|l| l.user_id == user_id).cloned())
    }

    async fn delete_chat_log_for_user(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let owned = tables.chat_logs.get(&id).is_some_and(|l| l.user_id == user_id);
        if owned {
            tables.chat_logs.remove(&id);
        }
        Ok(owned)
    }

    async fn create_navigation(&self, new_nav: NewNavigation) -> Result<Navigation, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_nav.created_by, "Navigation")?;

        let nav = Navigation {
            id: tables.next_id(),
            title: new_nav.title,
            description: new_nav.description,
            url: new_nav.url,
            created_by: new_nav.created_by,
        };
        tables.navigations.insert(nav.id, nav.clone());
        Ok(nav)
    }

    async fn list_navigations(&self, page: Page) -> Result<Vec<Navigation>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.navigations.values().cloned(), page))
    }

    async fn find_navigation(&self, id: i64) -> Result<Option<Navigation>, DatabaseError> {
        Ok(self.tables.read().await.navigations.get(&id).cloned())
    }

    async fn update_navigation(&self, id: i64, changes: NavigationChanges) -> Result<Navigation, DatabaseError> {
        let mut tables = self.tables.write().await;
        let nav = tables
            .navigations
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Navigation {}", id)))?;
        changes.apply(nav);
        Ok(nav.clone())
    }

    async fn delete_navigation(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.navigations.remove(&id).is_none() {
            return Ok(false);
        }
        tables.recommendations.retain(|_, r| r.content_id != id);
        Ok(true)
    }

    async fn append_action_log(&self, user_id: i64, action: &str) -> Result<ActionLog, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id, "Action log")?;

        let log = ActionLog {
            id: tables.next_id(),
            user_id,
            action: action.to_string(),
            timestamp: Utc::now(),
        };
        tables.action_logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn list_action_logs_by_user(&self, user_id: i64, page: Page) -> Result<Vec<ActionLog>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut logs: Vec<&ActionLog> = tables.action_logs.values().filter(|l| l.user_id == user_id).collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(paginate(logs.into_iter().cloned(), page))
    }

    async fn create_recommendation(&self, user_id: i64, content_id: i64) -> Result<Recommendation, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id, "Recommendation")?;
        if !tables.navigations.contains_key(&content_id) {
            return Err(DatabaseError::NotFound("Recommendation references a missing record".to_string()));
        }

        let rec = Recommendation {
            id: tables.next_id(),
            user_id,
            content_id,
            timestamp: Utc::now(),
        };
        tables.recommendations.insert(rec.id, rec.clone());
        Ok(rec)
    }

    async fn list_recommendations_by_user(&self, user_id: i64, page: Page) -> Result<Vec<RecommendedContent>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut recs: Vec<&Recommendation> = tables.recommendations.values().filter(|r| r.user_id == user_id).collect();
        recs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let joined = recs.into_iter().filter_map(|r| {
            tables.navigations.get(&r.content_id).map(|nav| RecommendedContent {
                id: r.id,
                user_id: r.user_id,
                timestamp: r.timestamp,
                content: nav.clone(),
            })
        });
        Ok(paginate(joined, page))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
