use std::sync::Arc;

use crate::auth::{AuthError, Credentials};
use crate::config::AppConfig;
use crate::database::{Page, PageParams, Repository};
use crate::services::ChatResponder;

/// Shared, read-only application context handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Arc<dyn Repository>,
    pub credentials: Arc<Credentials>,
    pub responder: Arc<dyn ChatResponder>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repo: Arc<dyn Repository>,
        responder: Arc<dyn ChatResponder>,
    ) -> Result<Self, AuthError> {
        let credentials = Credentials::new(&config.security)?;
        Ok(Self {
            config: Arc::new(config),
            repo,
            credentials: Arc::new(credentials),
            responder,
        })
    }

    /// Resolve requested pagination against the configured default and cap
    pub fn page(&self, params: PageParams) -> Page {
        params.resolve(self.config.api.default_page_size, self.config.api.max_page_size)
    }

    /// Append to the audit trail when enabled. Failures are logged, never returned.
    pub async fn audit(&self, user_id: i64, action: &str) {
        if !self.config.security.enable_audit_logging {
            return;
        }
        if let Err(e) = self.repo.append_action_log(user_id, action).await {
            tracing::warn!("Failed to record '{}' for user {}: {}", action, user_id, e);
        }
    }
}
