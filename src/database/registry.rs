use sqlx::SqlitePool;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::filter::json_field_expr;

const TABLE_PREFIX: &str = "entity_";

/// Strip every character outside `[A-Za-z0-9_]`.
///
/// Distinct raw names can collapse onto the same table ("Lead-Note" and
/// "LeadNote" both become `LeadNote`).
pub fn sanitize_entity_name(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect()
}

/// Tracks which entity tables exist and creates missing ones on first use.
pub struct EntityRegistry {
    pool: SqlitePool,
    indexed_fields: Vec<String>,
    known: RwLock<HashSet<String>>,
}

impl EntityRegistry {
    pub fn new(pool: SqlitePool, indexed_fields: Vec<String>) -> Self {
        Self {
            pool,
            indexed_fields,
            known: RwLock::new(HashSet::new()),
        }
    }

    pub fn table_name(sanitized: &str) -> String {
        format!("{}{}", TABLE_PREFIX, sanitized)
    }

    /// Ensure the table for `raw_name` exists and return the sanitized name.
    ///
    /// Safe under concurrent first access: the DDL is `IF NOT EXISTS` and the
    /// registry insert ignores conflicts.
    pub async fn ensure_table(&self, raw_name: &str) -> Result<String, DatabaseError> {
        let name = sanitize_entity_name(raw_name);
        if name.is_empty() {
            return Err(DatabaseError::InvalidEntityName(raw_name.to_string()));
        }

        if self.known.read().await.contains(&name) {
            return Ok(name);
        }

        let registered: Option<(String,)> =
            sqlx::query_as("SELECT name FROM _entity_registry WHERE name = ?")
                .bind(&name)
                .fetch_optional(&self.pool)
                .await?;

        if registered.is_none() {
            self.create_table(&name).await?;
        }

        self.known.write().await.insert(name.clone());
        Ok(name)
    }

    /// Every entity name recorded in the registry.
    pub async fn entities(&self) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM _entity_registry ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn create_table(&self, name: &str) -> Result<(), DatabaseError> {
        let table = Self::table_name(name);
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL DEFAULT '{{}}',
                created_by TEXT,
                created_at TEXT NOT NULL DEFAULT {now},
                updated_at TEXT NOT NULL DEFAULT {now}
            )
            "#,
            table = table,
            now = DatabaseManager::sql_now()
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        // Indexes only speed up filtering; a failure must not block the table.
        for field in &self.indexed_fields {
            let index = format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{table}_{field}\" ON \"{table}\" ({expr})",
                table = table,
                field = field,
                expr = json_field_expr(field)
            );
            if let Err(e) = sqlx::query(&index).execute(&self.pool).await {
                warn!("Skipping index on {}.{}: {}", table, field, e);
            }
        }

        sqlx::query("INSERT OR IGNORE INTO _entity_registry (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        info!("Created entity table: {}", table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry() -> EntityRegistry {
        let pool = DatabaseManager::open_in_memory().await.unwrap();
        EntityRegistry::new(pool, vec!["email".to_string(), "status".to_string()])
    }

    async fn count_tables(pool: &SqlitePool, table: &str) -> i64 {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(pool)
                .await
                .unwrap();
        n
    }

    #[test]
    fn sanitizes_to_identifier_characters() {
        assert_eq!(sanitize_entity_name("Student Profile"), "StudentProfile");
        assert_eq!(sanitize_entity_name("x; DROP TABLE x;--"), "xDROPTABLEx");
        assert_eq!(sanitize_entity_name("lead-note_v2"), "leadnote_v2");
        assert_eq!(sanitize_entity_name("Ünïcode"), "ncode");
    }

    #[tokio::test]
    async fn creates_table_indexes_and_registry_row_once() {
        let registry = registry().await;
        assert_eq!(registry.ensure_table("Application").await.unwrap(), "Application");
        assert_eq!(registry.ensure_table("Application").await.unwrap(), "Application");

        assert_eq!(count_tables(&registry.pool, "entity_Application").await, 1);
        assert_eq!(registry.entities().await.unwrap(), vec!["Application".to_string()]);

        let (indexes,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'entity_Application' AND name LIKE 'idx_%'",
        )
        .fetch_one(&registry.pool)
        .await
        .unwrap();
        assert_eq!(indexes, 2);
    }

    #[tokio::test]
    async fn failed_index_does_not_block_the_table() {
        let pool = DatabaseManager::open_in_memory().await.unwrap();
        let registry = EntityRegistry::new(pool.clone(), vec!["bad')x".to_string(), "status".to_string()]);

        assert_eq!(registry.ensure_table("Lead").await.unwrap(), "Lead");
        assert_eq!(count_tables(&pool, "entity_Lead").await, 1);
        assert_eq!(registry.entities().await.unwrap(), vec!["Lead".to_string()]);

        let indexes: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'entity_Lead' AND name LIKE 'idx_%'",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(indexes, vec![("idx_entity_Lead_status".to_string(),)]);
    }

    #[tokio::test]
    async fn colliding_names_share_a_table() {
        let registry = registry().await;
        let a = registry.ensure_table("Lead-Note").await.unwrap();
        let b = registry.ensure_table("LeadNote").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.entities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_names_that_sanitize_to_nothing() {
        let registry = registry().await;
        let err = registry.ensure_table("--;").await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEntityName(_)));
    }

    #[tokio::test]
    async fn registry_survives_a_fresh_process_cache() {
        let pool = DatabaseManager::open_in_memory().await.unwrap();
        let first = EntityRegistry::new(pool.clone(), vec![]);
        first.ensure_table("Task").await.unwrap();

        // A new registry has an empty memo but must not re-run DDL.
        let second = EntityRegistry::new(pool.clone(), vec![]);
        assert_eq!(second.ensure_table("Task").await.unwrap(), "Task");
        assert_eq!(count_tables(&pool, "entity_Task").await, 1);
    }
}
