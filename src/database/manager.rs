use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::error::FilterError;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid entity name: {0}")]
    InvalidEntityName(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// True when the underlying driver reported a UNIQUE constraint failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation())
    }
}

/// Format produced by column defaults; matches `document::timestamp_now`.
const SQL_NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

/// Owns the process-wide SQLite pool and the fixed (non-entity) schema.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Process-wide pool. The first call opens it from `config`; later calls
    /// return the same handle and ignore their argument.
    pub async fn connection(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
        static POOL: OnceCell<SqlitePool> = OnceCell::const_new();
        POOL.get_or_try_init(|| Self::open(config)).await.cloned()
    }

    /// Open a fresh pool with WAL and foreign keys enabled, then create the
    /// fixed tables. Not memoized.
    pub async fn open(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
        if config.path == ":memory:" {
            return Self::open_in_memory().await;
        }

        let path = Path::new(&config.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {}", parent.display());
            }
        }

        let mut options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));
        if !config.enable_query_logging {
            options = options.disable_statement_logging();
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::bootstrap(&pool).await?;
        info!("Opened database at {}", path.display());
        Ok(pool)
    }

    /// Single-connection in-memory database. The connection is never
    /// recycled, since closing it would discard the data.
    pub async fn open_in_memory() -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::bootstrap(&pool).await?;
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    async fn bootstrap(pool: &SqlitePool) -> Result<(), DatabaseError> {
        let users = format!(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                role TEXT NOT NULL DEFAULT 'student',
                phone TEXT,
                avatar_url TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT {now},
                updated_at TEXT NOT NULL DEFAULT {now}
            )
            "#,
            now = SQL_NOW
        );
        let registry = format!(
            r#"
            CREATE TABLE IF NOT EXISTS _entity_registry (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT {now}
            )
            "#,
            now = SQL_NOW
        );

        sqlx::query(&users).execute(pool).await?;
        sqlx::query(&registry).execute(pool).await?;
        Ok(())
    }

    pub(crate) fn sql_now() -> &'static str {
        SQL_NOW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstraps_fixed_tables() {
        let pool = DatabaseManager::open_in_memory().await.unwrap();
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<String> = names.into_iter().map(|(n,)| n).collect();
        assert!(names.contains(&"users".to_string()));
        assert!(names.contains(&"_entity_registry".to_string()));
    }

    #[tokio::test]
    async fn creates_missing_directory_and_enables_wal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::config::AppConfig::testing().database;
        config.path = dir.path().join("nested/db/crm.db").to_string_lossy().into_owned();
        config.max_connections = 2;

        let pool = DatabaseManager::open(&config).await.unwrap();
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(&pool).await.unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        let (fk,): (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(&pool).await.unwrap();
        assert_eq!(fk, 1);
        assert!(dir.path().join("nested/db").is_dir());
    }

    #[tokio::test]
    async fn health_check_succeeds() {
        let pool = DatabaseManager::open_in_memory().await.unwrap();
        assert!(DatabaseManager::health_check(&pool).await.is_ok());
    }
}
