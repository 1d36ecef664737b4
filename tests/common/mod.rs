#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use psychat_api::auth::Credentials;
use psychat_api::config::AppConfig;
use psychat_api::database::models::ROLE_ADMIN;
use psychat_api::database::{MemoryRepository, Repository};
use psychat_api::services::{ChatResponder, EchoResponder};
use psychat_api::state::AppState;

/// A router serving on a free local port, backed by a fresh in-memory store
/// unless a repository is supplied.
///
/// The server task lives on the test's runtime, so each test gets its own
/// isolated instance.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub repo: Arc<dyn Repository>,
    pub credentials: Arc<Credentials>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.secret_key = "integration-test-secret".to_string();
    // Cheap hashing keeps the suite fast
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(test_config(), Arc::new(EchoResponder)).await
}

pub async fn spawn_server_with(config: AppConfig, responder: Arc<dyn ChatResponder>) -> Result<TestServer> {
    spawn_server_on(config, Arc::new(MemoryRepository::new()), responder).await
}

pub async fn spawn_server_on(
    config: AppConfig,
    repo: Arc<dyn Repository>,
    responder: Arc<dyn ChatResponder>,
) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let state = AppState::new(config, repo.clone(), responder)?;
    let credentials = state.credentials.clone();

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind {}", base_url))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, psychat_api::app(state)).await;
    });

    let server = TestServer {
        base_url,
        client: reqwest::Client::new(),
        repo,
        credentials,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<reqwest::Response> {
        let res = self
            .client
            .post(self.url("/api/register"))
            .json(&json!({ "email": email, "username": username, "password": password }))
            .send()
            .await?;
        Ok(res)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<reqwest::Response> {
        let res = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(res)
    }

    /// Register a user and return `(user_id, access_token)`
    pub async fn signup(&self, username: &str) -> Result<(i64, String)> {
        let email = format!("{}@example.com", username);
        let password = format!("{}-password", username);

        let res = self.register(&email, username, &password).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "register failed: {}", res.status());
        let user: Value = res.json().await?;
        let id = user["id"].as_i64().context("user id missing")?;

        let res = self.login(&email, &password).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let token: Value = res.json().await?;
        let token = token["access_token"].as_str().context("token missing")?.to_string();

        Ok((id, token))
    }

    /// Register a user and grant the admin role directly in the store
    pub async fn signup_admin(&self, username: &str) -> Result<(i64, String)> {
        let (id, token) = self.signup(username).await?;
        self.repo.set_user_role(id, ROLE_ADMIN).await?;
        Ok((id, token))
    }
}

/// Assert the standard error body and return its message
pub async fn expect_error(res: reqwest::Response, status: StatusCode, code: &str) -> Result<String> {
    assert_eq!(res.status(), status);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["code"], json!(code), "unexpected body: {}", body);
    Ok(body["message"].as_str().unwrap_or_default().to_string())
}
