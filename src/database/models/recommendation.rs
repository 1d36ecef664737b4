use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::navigation::Navigation;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recommendation {
    pub id: i64,
    pub user_id: i64,
    pub content_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// Recommendation joined with the navigation item it points at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedContent {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub content: Navigation,
}
