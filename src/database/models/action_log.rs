use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Append-only audit entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionLog {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}
