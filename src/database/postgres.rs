use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    ActionLog, ChatLog, Navigation, NavigationChanges, NewChatLog, NewNavigation, NewUser,
    Recommendation, RecommendedContent, User, UserChanges,
};
use crate::database::repository::{Page, Repository};

const USER_COLUMNS: &str = "id, email, username, password_hash, role, is_active, created_at";
const CHAT_COLUMNS: &str = r#"id, user_id, message, response, "timestamp""#;
const NAV_COLUMNS: &str = "id, title, description, url, created_by";

/// [`Repository`] backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RecommendationRow {
    id: i64,
    user_id: i64,
    timestamp: DateTime<Utc>,
    content_id: i64,
    title: String,
    description: Option<String>,
    url: Option<String>,
    created_by: i64,
}

impl From<RecommendationRow> for RecommendedContent {
    fn from(row: RecommendationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            timestamp: row.timestamp,
            content: Navigation {
                id: row.content_id,
                title: row.title,
                description: row.description,
                url: row.url,
                created_by: row.created_by,
            },
        }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (email, username, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "User"))
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, DatabaseError> {
        // COALESCE keeps the stored value for columns absent from the patch
        let sql = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                username = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash)
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.username)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "User"))?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {}", id)))
    }

    async fn set_user_role(&self, id: i64, role: &str) -> Result<User, DatabaseError> {
        let sql = format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {}", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {}", id)))
    }

    async fn create_chat_log(&self, new_log: NewChatLog) -> Result<ChatLog, DatabaseError> {
        let sql = format!(
            "INSERT INTO chat_logs (user_id, message, response) VALUES ($1, $2, $3) RETURNING {}",
            CHAT_COLUMNS
        );
        sqlx::query_as::<_, ChatLog>(&sql)
            .bind(new_log.user_id)
            .bind(&new_log.message)
            .bind(&new_log.response)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "Chat log"))
    }

    async fn list_chat_logs_by_user(&self, user_id: i64, page: Page) -> Result<Vec<ChatLog>, DatabaseError> {
        let sql = format!(
            r#"SELECT {} FROM chat_logs WHERE user_id = $1
               ORDER BY "timestamp" DESC, id DESC OFFSET $2 LIMIT $3"#,
            CHAT_COLUMNS
        );
        let logs = sqlx::query_as::<_, ChatLog>(&sql)
            .bind(user_id)
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }

    async fn find_chat_log_for_user(&self, id: i64, user_id: i64) -> Result<Option<ChatLog>, DatabaseError> {
        let sql = format!("SELECT {} FROM chat_logs WHERE id = $1 AND user_id = $2", CHAT_COLUMNS);
        let log = sqlx::query_as::<_, ChatLog>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(log)
    }

    async fn delete_chat_log_for_user(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM chat_logs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_navigation(&self, new_nav: NewNavigation) -> Result<Navigation, DatabaseError> {
        let sql = format!(
            "INSERT INTO navigation (title, description, url, created_by) VALUES ($1, $2, $3, $4) RETURNING {}",
            NAV_COLUMNS
        );
        sqlx::query_as::<_, Navigation>(&sql)
            .bind(&new_nav.title)
            .bind(&new_nav.description)
            .bind(&new_nav.url)
            .bind(new_nav.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "Navigation"))
    }

    async fn list_navigations(&self, page: Page) -> Result<Vec<Navigation>, DatabaseError> {
        let sql = format!("SELECT {} FROM navigation ORDER BY id OFFSET $1 LIMIT $2", NAV_COLUMNS);
        let navs = sqlx::query_as::<_, Navigation>(&sql)
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(navs)
    }

    async fn find_navigation(&self, id: i64) -> Result<Option<Navigation>, DatabaseError> {
        let sql = format!("SELECT {} FROM navigation WHERE id = $1", NAV_COLUMNS);
        let nav = sqlx::query_as::<_, Navigation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(nav)
    }

    async fn update_navigation(&self, id: i64, changes: NavigationChanges) -> Result<Navigation, DatabaseError> {
        // Nullable columns carry an explicit "touch" flag so that null can clear them
        let sql = format!(
            "UPDATE navigation SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                url = CASE WHEN $5 THEN $6 ELSE url END
             WHERE id = $1
             RETURNING {}",
            NAV_COLUMNS
        );
        let touch_description = changes.description.is_some();
        let touch_url = changes.url.is_some();
        sqlx::query_as::<_, Navigation>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(touch_description)
            .bind(changes.description.flatten())
            .bind(touch_url)
            .bind(changes.url.flatten())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Navigation {}", id)))
    }

    async fn delete_navigation(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM navigation WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_action_log(&self, user_id: i64, action: &str) -> Result<ActionLog, DatabaseError> {
        sqlx::query_as::<_, ActionLog>(
            r#"INSERT INTO logs (user_id, action) VALUES ($1, $2)
               RETURNING id, user_id, action, "timestamp""#,
        )
        .bind(user_id)
        .bind(action)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "Action log"))
    }

    async fn list_action_logs_by_user(&self, user_id: i64, page: Page) -> Result<Vec<ActionLog>, DatabaseError> {
        let logs = sqlx::query_as::<_, ActionLog>(
            r#"SELECT id, user_id, action, "timestamp" FROM logs WHERE user_id = $1
               ORDER BY "timestamp" DESC, id DESC OFFSET $2 LIMIT $3"#,
        )
        .bind(user_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    async fn create_recommendation(&self, user_id: i64, content_id: i64) -> Result<Recommendation, DatabaseError> {
        sqlx::query_as::<_, Recommendation>(
            r#"INSERT INTO recommendations (user_id, content_id) VALUES ($1, $2)
               RETURNING id, user_id, content_id, "timestamp""#,
        )
        .bind(user_id)
        .bind(content_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "Recommendation"))
    }

    async fn list_recommendations_by_user(&self, user_id: i64, page: Page) -> Result<Vec<RecommendedContent>, DatabaseError> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r#"SELECT r.id, r.user_id, r."timestamp", r.content_id,
                      n.title, n.description, n.url, n.created_by
               FROM recommendations r
               JOIN navigation n ON n.id = r.content_id
               WHERE r.user_id = $1
               ORDER BY r."timestamp" DESC, r.id DESC
               OFFSET $2 LIMIT $3"#,
        )
        .bind(user_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RecommendedContent::from).collect())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
