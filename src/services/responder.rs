use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ChatConfig;

#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("Invalid text generation URL: {0}")]
    InvalidUrl(String),
    #[error("Text generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Text generation service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Text generation response had no generated_text")]
    MissingText,
}

/// Produces the reply stored alongside a chat message
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, message: &str) -> Result<String, ResponderError>;
}

/// Deterministic placeholder reply wrapping the user's message
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoResponder;

impl EchoResponder {
    pub fn reply_for(message: &str) -> String {
        format!("这是对'{}'的自动回复", message)
    }
}

#[async_trait]
impl ChatResponder for EchoResponder {
    async fn respond(&self, message: &str) -> Result<String, ResponderError> {
        Ok(Self::reply_for(message))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    max_length: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generated_text: Option<String>,
}

/// Delegates replies to an external `POST {base_url}/api/generate` service
#[derive(Debug, Clone)]
pub struct TextGenResponder {
    client: reqwest::Client,
    endpoint: Url,
    max_length: u32,
}

impl TextGenResponder {
    pub fn new(base_url: &str, max_length: u32, timeout: Duration) -> Result<Self, ResponderError> {
        let endpoint = Self::endpoint(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            max_length,
        })
    }

    fn endpoint(base_url: &str) -> Result<Url, ResponderError> {
        // A trailing slash keeps any path prefix when joining
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        Url::parse(&normalized)
            .and_then(|base| base.join("api/generate"))
            .map_err(|_| ResponderError::InvalidUrl(base_url.to_string()))
    }
}

#[async_trait]
impl ChatResponder for TextGenResponder {
    async fn respond(&self, message: &str) -> Result<String, ResponderError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                prompt: message,
                max_length: self.max_length,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.generated_text.ok_or(ResponderError::MissingText)
    }
}

/// Pick the responder the configuration asks for
pub fn from_config(config: &ChatConfig) -> Result<Box<dyn ChatResponder>, ResponderError> {
    match &config.textgen_base_url {
        Some(base_url) => {
            tracing::info!("Chat replies delegated to text generation service at {}", base_url);
            let responder = TextGenResponder::new(
                base_url,
                config.textgen_max_length,
                Duration::from_secs(config.textgen_timeout_secs),
            )?;
            Ok(Box::new(responder))
        }
        None => Ok(Box::new(EchoResponder)),
    }
}
