use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// One year
pub const MAX_SESSION_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
    pub sessions: SessionConfig,
    pub cors: CorsConfig,
    pub versioning: VersioningConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base for self links; the request's `Host` header is used when unset
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; the in-memory store is used when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub key: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub lifetime_minutes: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to POST to the camps endpoints
    pub camp_writer_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    pub default_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub password_hash_cost: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Environment preset, then the YAML file (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::preset();

        if let Some(path) = path {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            config = config.merge_yaml(&text)?;
        }

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn preset() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Self::production(),
            Ok("staging") | Ok("stage") => Self::staging(),
            _ => Self::development(),
        }
    }

    /// Overlay a partial YAML document onto this config; absent keys keep their values
    pub fn merge_yaml(self, text: &str) -> Result<Self, ConfigError> {
        let overlay: serde_yaml::Value = serde_yaml::from_str(text)?;
        if overlay.is_null() {
            return Ok(self);
        }
        let mut base = serde_yaml::to_value(&self)?;
        merge_values(&mut base, overlay);
        Ok(serde_yaml::from_value(base)?)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(v).filter(|s| !s.is_empty());
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Token overrides
        if let Ok(v) = env::var("TOKENS_KEY") {
            self.tokens.key = v;
        }
        if let Ok(v) = env::var("TOKENS_ISSUER") {
            self.tokens.issuer = v;
        }
        if let Ok(v) = env::var("TOKENS_AUDIENCE") {
            self.tokens.audience = v;
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_LIFETIME_MINUTES") {
            self.sessions.lifetime_minutes = v.parse().unwrap_or(self.sessions.lifetime_minutes);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.sessions.secure_cookie = v.parse().unwrap_or(self.sessions.secure_cookie);
        }

        // CORS overrides
        if let Ok(v) = env::var("CORS_CAMP_WRITER_ORIGINS") {
            self.cors.camp_writer_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(v) = env::var("API_DEFAULT_VERSION") {
            self.versioning.default_version = v;
        }
        if let Ok(v) = env::var("PASSWORD_HASH_COST") {
            self.security.password_hash_cost = v.parse().unwrap_or(self.security.password_hash_cost);
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.key.len() < 16 {
            return Err(ConfigError::Invalid("tokens.key must be at least 16 bytes".into()));
        }
        if !(1..=MAX_SESSION_MINUTES).contains(&self.sessions.lifetime_minutes) {
            return Err(ConfigError::Invalid(format!(
                "sessions.lifetime_minutes must be 1..={}",
                MAX_SESSION_MINUTES
            )));
        }
        if crate::versioning::ApiVersion::parse(&self.versioning.default_version).is_none() {
            return Err(ConfigError::Invalid(format!(
                "versioning.default_version '{}' is not a version",
                self.versioning.default_version
            )));
        }
        if !(4..=31).contains(&self.security.password_hash_cost) {
            return Err(ConfigError::Invalid("security.password_hash_cost must be 4..=31".into()));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            tokens: TokenConfig {
                key: "development-signing-key-change-me".to_string(),
                issuer: "http://mycodecamp.io".to_string(),
                audience: "http://mycodecamp.io".to_string(),
            },
            sessions: SessionConfig {
                cookie_name: "codecamp_session".to_string(),
                lifetime_minutes: 20,
                secure_cookie: false,
            },
            cors: CorsConfig {
                camp_writer_origins: vec!["http://wildermuth.com".to_string()],
            },
            versioning: VersioningConfig {
                default_version: "1.1".to_string(),
            },
            security: SecurityConfig { password_hash_cost: 10 },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.host = "0.0.0.0".to_string();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.sessions.secure_cookie = true;
        config.security.password_hash_cost = bcrypt::DEFAULT_COST;
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config
    }
}

fn merge_values(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Owner of the live configuration.
///
/// Requests take an `Arc` snapshot and keep it for their whole lifetime;
/// `reload` re-reads the file and environment and swaps the value in one step.
#[derive(Debug)]
pub struct ConfigHandle {
    source: Option<PathBuf>,
    current: RwLock<Arc<AppConfig>>,
}

impl ConfigHandle {
    pub fn load(source: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = AppConfig::load(source.as_deref())?;
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// A handle that never reads from disk; reload re-validates the value in place
    pub fn fixed(config: AppConfig) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<AppConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read configuration. On failure the previous value stays live.
    pub fn reload(&self) -> Result<Arc<AppConfig>, ConfigError> {
        let next = match &self.source {
            Some(path) => Arc::new(AppConfig::load(Some(path))?),
            None => {
                let current = self.snapshot();
                current.validate()?;
                current
            }
        };

        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&next);

        match &self.source {
            Some(path) => info!("Configuration reloaded from {}", path.display()),
            None => warn!("Configuration reload requested without a config file"),
        }
        Ok(next)
    }
}
