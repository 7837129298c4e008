pub mod session;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenConfig;

pub use session::{Session, SessionStore};

/// Bearer tokens are valid for this long after issuance
pub const TOKEN_LIFETIME_MINUTES: i64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Token signing key is not configured")]
    InvalidSecret,

    #[error("Timestamp out of range")]
    InvalidTimestamp,

    #[error("Hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

pub fn issue_token(username: &str, config: &TokenConfig) -> Result<IssuedToken, AuthError> {
    issue_token_at(username, config, Utc::now())
}

/// Mint an HS256 token for `username` as if issued at `now`
pub fn issue_token_at(
    username: &str,
    config: &TokenConfig,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    if config.key.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    // JWT timestamps carry whole seconds
    let iat = now.timestamp();
    let exp = iat + Duration::minutes(TOKEN_LIFETIME_MINUTES).num_seconds();
    let claims = Claims {
        sub: username.to_string(),
        jti: Uuid::new_v4().to_string(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        iat,
        exp,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.key.as_bytes()),
    )?;
    let expiration = Utc
        .timestamp_opt(exp, 0)
        .single()
        .ok_or(AuthError::InvalidTimestamp)?;

    Ok(IssuedToken { token, expiration })
}

/// Check signature, expiry, issuer and audience
pub fn validate_token(token: &str, config: &TokenConfig) -> Result<Claims, AuthError> {
    if config.key.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.key.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// bcrypt hashing on the blocking pool.
///
/// `verify_absent` burns the same work as a real check so callers can answer
/// an unknown username no faster than a wrong password.
#[derive(Debug)]
pub struct PasswordHasher {
    cost: u32,
    dummy: OnceCell<String>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy: OnceCell::new(),
        }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let hash = hash.to_string();
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(ok)
    }

    pub async fn verify_absent(&self, password: &str) -> Result<(), AuthError> {
        let dummy = match self.dummy.get() {
            Some(hash) => hash.clone(),
            None => {
                let hash = self.hash("codecamp-placeholder").await?;
                self.dummy.get_or_init(|| hash).clone()
            }
        };
        self.verify(password, &dummy).await?;
        Ok(())
    }
}
