use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used when none is configured outside production.
const DEVELOPMENT_JWT_SECRET: &str = "edu-crm-development-secret";

/// Fields indexed on every entity table unless overridden.
const DEFAULT_INDEXED_FIELDS: &[&str] = &[
    "email",
    "status",
    "student_id",
    "user_id",
    "counselor_id",
    "partner_id",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingJwtSecret,

    #[error("Invalid indexed field name: {0}")]
    InvalidIndexedField(String),

    #[error("SECURITY_CORS_ORIGINS cannot contain '*' while credentials are allowed; list origins explicitly")]
    WildcardCorsOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
    pub indexed_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub max_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    #[serde(skip)]
    pub jwt_secret_from_env: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_PATH") {
            self.database.path = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = v.parse().unwrap_or(self.database.busy_timeout_ms);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }
        if let Ok(v) = env::var("DATABASE_INDEXED_FIELDS") {
            self.database.indexed_fields = split_list(&v);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_MAX_LIMIT") {
            self.api.max_limit = v.parse().ok();
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = v;
                self.security.jwt_secret_from_env = true;
            }
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        self
    }

    /// Checks settings that must hold before the server accepts traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production && !self.security.jwt_secret_from_env {
            return Err(ConfigError::MissingJwtSecret);
        }
        if let Some(field) = self
            .database
            .indexed_fields
            .iter()
            .find(|f| !crate::filter::is_valid_field_name(f))
        {
            return Err(ConfigError::InvalidIndexedField(field.clone()));
        }
        if self.security.cors_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::WildcardCorsOrigin);
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                path: "./data/edu_crm.db".to_string(),
                max_connections: 5,
                busy_timeout_ms: 5_000,
                enable_query_logging: true,
                slow_query_threshold_ms: 100,
                indexed_fields: default_indexed_fields(),
            },
            api: ApiConfig {
                port: 3001,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                max_limit: None,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 30,
                bcrypt_cost: 10,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                jwt_secret_from_env: false,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.enable_query_logging = false;
        config.database.slow_query_threshold_ms = 500;
        config.api.max_request_size_bytes = 5 * 1024 * 1024;
        config.security.bcrypt_cost = 12;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.path = "/var/lib/edu-crm/edu_crm.db".to_string();
        config.database.max_connections = 10;
        config.database.enable_query_logging = false;
        config.database.slow_query_threshold_ms = 1_000;
        config.api.port = 8080;
        config.api.max_request_size_bytes = 2 * 1024 * 1024;
        config.security.jwt_secret = String::new();
        config.security.bcrypt_cost = 12;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config
    }

    /// Settings for in-process tests: in-memory database, fast hashing.
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.database.path = ":memory:".to_string();
        config.database.max_connections = 1;
        config.security.jwt_secret = "test-secret".to_string();
        config.security.bcrypt_cost = 4;
        config
    }
}

fn default_indexed_fields() -> Vec<String> {
    DEFAULT_INDEXED_FIELDS.iter().map(|s| s.to_string()).collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
