use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used when development mode runs without SECRET_KEY
const DEVELOPMENT_SECRET: &str = "psychat-development-secret";

/// Longest accepted token lifetime: ten years
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    /// Empty list or a single "*" allows any origin
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
    pub argon2_memory_cost_kib: u32,
    pub argon2_time_cost: u32,
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Text generation service; the echo responder is used when unset
    pub textgen_base_url: Option<String>,
    pub textgen_max_length: u32,
    pub textgen_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(v) = env::var("PSYCHAT_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("PSYCHAT_API_HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }

        // Security overrides
        if let Ok(v) = env::var("SECRET_KEY") {
            self.security.secret_key = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.access_token_expire_minutes = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", &v)?;
        }
        if let Ok(v) = env::var("BACKEND_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }
        if let Ok(v) = env::var("ARGON2_MEMORY_COST_KIB") {
            self.security.argon2_memory_cost_kib = v.parse().unwrap_or(self.security.argon2_memory_cost_kib);
        }
        if let Ok(v) = env::var("ARGON2_TIME_COST") {
            self.security.argon2_time_cost = v.parse().unwrap_or(self.security.argon2_time_cost);
        }
        if let Ok(v) = env::var("ARGON2_PARALLELISM") {
            self.security.argon2_parallelism = v.parse().unwrap_or(self.security.argon2_parallelism);
        }

        // Chat overrides
        if let Ok(v) = env::var("TEXTGEN_BASE_URL") {
            let trimmed = v.trim();
            self.chat.textgen_base_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Ok(v) = env::var("TEXTGEN_MAX_LENGTH") {
            self.chat.textgen_max_length = v.parse().unwrap_or(self.chat.textgen_max_length);
        }
        if let Ok(v) = env::var("TEXTGEN_TIMEOUT_SECS") {
            self.chat.textgen_timeout_secs = v.parse().unwrap_or(self.chat.textgen_timeout_secs);
        }

        Ok(self)
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.security.secret_key.is_empty() {
            if self.environment != Environment::Development {
                return Err(ConfigError::Missing("SECRET_KEY"));
            }
            tracing::warn!("SECRET_KEY not set, using the development signing secret");
            self.security.secret_key = DEVELOPMENT_SECRET.to_string();
        }
        let ttl = self.security.access_token_expire_minutes;
        if ttl <= 0 || ttl > MAX_ACCESS_TOKEN_EXPIRE_MINUTES {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: self.security.access_token_expire_minutes.to_string(),
            });
        }
        if let Some(base) = &self.chat.textgen_base_url {
            url::Url::parse(base).map_err(|_| ConfigError::Invalid {
                name: "TEXTGEN_BASE_URL",
                value: base.clone(),
            })?;
        }
        self.api.max_page_size = self.api.max_page_size.max(1);
        self.api.default_page_size = self.api.default_page_size.clamp(1, self.api.max_page_size);
        Ok(self)
    }

    /// True when CORS should allow every origin
    pub fn cors_permissive(&self) -> bool {
        let origins = &self.security.cors_origins;
        origins.is_empty() || origins.iter().any(|o| o == "*")
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                default_page_size: 100,
                max_page_size: 1000,
            },
            security: SecurityConfig {
                secret_key: String::new(),
                access_token_expire_minutes: 60 * 24 * 8, // 8 days
                cors_origins: Vec::new(),
                enable_audit_logging: true,
                argon2_memory_cost_kib: 8192,
                argon2_time_cost: 3,
                argon2_parallelism: 1,
            },
            chat: ChatConfig {
                textgen_base_url: None,
                textgen_max_length: 100,
                textgen_timeout_secs: 30,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                default_page_size: 100,
                max_page_size: 500,
            },
            security: SecurityConfig {
                secret_key: String::new(),
                access_token_expire_minutes: 60 * 24,
                cors_origins: vec!["https://staging.psychat.example.com".to_string()],
                enable_audit_logging: true,
                argon2_memory_cost_kib: 19456,
                argon2_time_cost: 2,
                argon2_parallelism: 1,
            },
            chat: ChatConfig {
                textgen_base_url: None,
                textgen_max_length: 100,
                textgen_timeout_secs: 20,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                default_page_size: 100,
                max_page_size: 100,
            },
            security: SecurityConfig {
                secret_key: String::new(),
                access_token_expire_minutes: 60 * 24,
                cors_origins: vec!["https://app.psychat.example.com".to_string()],
                enable_audit_logging: true,
                argon2_memory_cost_kib: 19456,
                argon2_time_cost: 2,
                argon2_parallelism: 1,
            },
            chat: ChatConfig {
                textgen_base_url: None,
                textgen_max_length: 100,
                textgen_timeout_secs: 10,
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.security.access_token_expire_minutes, 11520);
        assert!(config.cors_permissive());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.max_page_size, 100);
        assert!(!config.cors_permissive());
    }

    #[test]
    fn development_falls_back_to_dev_secret() {
        let config = AppConfig::development().validate().unwrap();
        assert_eq!(config.security.secret_key, DEVELOPMENT_SECRET);
    }

    #[test]
    fn production_requires_secret() {
        let err = AppConfig::production().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SECRET_KEY")));
    }

    #[test]
    fn rejects_malformed_textgen_url() {
        let mut config = AppConfig::development();
        config.chat.textgen_base_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn default_page_size_stays_within_cap() {
        let mut config = AppConfig::development();
        config.api.max_page_size = 50;
        config.api.default_page_size = 200;
        let config = config.validate().unwrap();
        assert_eq!(config.api.default_page_size, 50);
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let mut config = AppConfig::development();
        config.security.access_token_expire_minutes = MAX_ACCESS_TOKEN_EXPIRE_MINUTES;
        assert!(config.validate().is_ok());

        for minutes in [0, -5, MAX_ACCESS_TOKEN_EXPIRE_MINUTES + 1, 1_000_000_000_000] {
            let mut config = AppConfig::development();
            config.security.access_token_expire_minutes = minutes;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Invalid { name: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
            ));
        }
    }

    #[test]
    fn splits_cors_origins() {
        assert_eq!(
            split_list("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
