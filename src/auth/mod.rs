pub mod validate;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Token type reported alongside issued access tokens
pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: i64, ttl: Duration) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenGeneration(format!("token lifetime {} overflows", ttl)))?;
        Ok(Self {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    /// Bad signature, malformed payload or expired token
    #[error("Invalid token")]
    InvalidToken,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Invalid token lifetime: {0} minutes")]
    InvalidTokenLifetime(i64),
}

/// Password hashing and bearer token issuance, configured once at startup
#[derive(Clone)]
pub struct Credentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    params: Params,
    /// Hash checked when no account matches, so unknown emails cost the same
    /// as wrong passwords
    decoy_hash: String,
}

impl Credentials {
    pub fn new(config: &SecurityConfig) -> Result<Self, AuthError> {
        if config.secret_key.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let token_ttl = Duration::try_minutes(config.access_token_expire_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(AuthError::InvalidTokenLifetime(config.access_token_expire_minutes))?;

        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Hashing(format!("Invalid Argon2 params: {}", e)))?;

        let mut validation = Validation::default();
        // Expiry is exact; a token is dead the second its TTL runs out
        validation.leeway = 0;

        let mut credentials = Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
            token_ttl,
            params,
            decoy_hash: String::new(),
        };
        credentials.decoy_hash = credentials.hash_password(&Uuid::new_v4().to_string())?;
        Ok(credentials)
    }

    /// Lifetime of tokens issued by [`Credentials::issue_access_token`]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn issue_token(&self, user_id: i64, ttl: Duration) -> Result<String, AuthError> {
        encode(&Header::default(), &Claims::new(user_id, ttl)?, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn issue_access_token(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_token(user_id, self.token_ttl)
    }

    /// Verify signature and expiry, returning the user id the token was issued for
    pub fn validate_token(&self, token: &str) -> Result<i64, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        data.claims.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Salted Argon2id hash in PHC string format
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// False on mismatch and on hashes that cannot be parsed
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.hasher().verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }

    /// [`Credentials::hash_password`] on the blocking pool
    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let credentials = self.clone();
        tokio::task::spawn_blocking(move || credentials.hash_password(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("Hashing task failed: {}", e)))?
    }

    /// Burn one verification against the decoy hash; always false
    pub async fn verify_decoy(&self, password: String) -> bool {
        self.verify(password, self.decoy_hash.clone()).await
    }

    /// [`Credentials::verify_password`] on the blocking pool
    pub async fn verify(&self, password: String, hash: String) -> bool {
        let credentials = self.clone();
        tokio::task::spawn_blocking(move || credentials.verify_password(&password, &hash))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Password verification task failed: {}", e);
                false
            })
    }
}
