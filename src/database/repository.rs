use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::document::{shallow_merge, take_id, timestamp_now, Document, EntityRecord, EntityRow};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::registry::EntityRegistry;
use crate::filter::{Filter, SqlParam};

/// Document store keyed by (entity name, id).
///
/// Every operation bootstraps the entity's table first, so an unknown entity
/// behaves like an empty one.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Equality filters plus `sort`/`limit`, taken from query-string pairs.
    async fn list(&self, entity: &str, query: &[(String, String)]) -> Result<Vec<EntityRecord>, DatabaseError>;

    async fn get(&self, entity: &str, id: &str) -> Result<EntityRecord, DatabaseError>;

    async fn create(&self, entity: &str, body: Value, created_by: Option<&str>) -> Result<EntityRecord, DatabaseError>;

    /// Shallow-merge `body` into the stored document.
    async fn update(&self, entity: &str, id: &str, body: Value) -> Result<EntityRecord, DatabaseError>;

    async fn delete(&self, entity: &str, id: &str) -> Result<(), DatabaseError>;
}

pub struct SqliteEntityStore {
    pool: SqlitePool,
    registry: EntityRegistry,
    max_limit: Option<u32>,
    slow_query_threshold: Duration,
}

impl SqliteEntityStore {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        Self {
            registry: EntityRegistry::new(pool.clone(), config.database.indexed_fields.clone()),
            pool,
            max_limit: config.api.max_limit,
            slow_query_threshold: Duration::from_millis(config.database.slow_query_threshold_ms),
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    async fn table(&self, entity: &str) -> Result<(String, String), DatabaseError> {
        let name = self.registry.ensure_table(entity).await?;
        let table = EntityRegistry::table_name(&name);
        Ok((name, table))
    }

    async fn fetch(&self, table: &str, id: &str) -> Result<Option<EntityRecord>, DatabaseError> {
        let sql = format!(
            "SELECT id, data, created_by, created_at, updated_at FROM \"{}\" WHERE id = ?",
            table
        );
        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EntityRecord::try_from).transpose()?)
    }

    fn observe(&self, operation: &str, table: &str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed >= self.slow_query_threshold {
            tracing::warn!("Slow {} on {}: {:?}", operation, table, elapsed);
        } else {
            tracing::trace!("{} on {} took {:?}", operation, table, elapsed);
        }
    }
}

fn into_document(body: Value) -> Result<Document, DatabaseError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(DatabaseError::Validation("Request body must be a JSON object".to_string())),
    }
}

fn not_found(entity: &str, id: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("{} '{}' not found", entity, id))
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn list(&self, entity: &str, query: &[(String, String)]) -> Result<Vec<EntityRecord>, DatabaseError> {
        let (_, table) = self.table(entity).await?;
        let sql = Filter::from_query(&table, query, self.max_limit)?.to_sql();

        let started = Instant::now();
        let mut q = sqlx::query_as::<_, EntityRow>(&sql.query);
        for param in &sql.params {
            q = match param {
                SqlParam::Text(s) => q.bind(s.as_str()),
                SqlParam::Integer(i) => q.bind(*i),
            };
        }
        let rows = q.fetch_all(&self.pool).await?;
        self.observe("list", &table, started);

        rows.into_iter()
            .map(|row| EntityRecord::try_from(row).map_err(DatabaseError::from))
            .collect()
    }

    async fn get(&self, entity: &str, id: &str) -> Result<EntityRecord, DatabaseError> {
        let (name, table) = self.table(entity).await?;
        self.fetch(&table, id).await?.ok_or_else(|| not_found(&name, id))
    }

    async fn create(&self, entity: &str, body: Value, created_by: Option<&str>) -> Result<EntityRecord, DatabaseError> {
        let (name, table) = self.table(entity).await?;
        let mut data = into_document(body)?;
        let id = take_id(&mut data).unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = timestamp_now();

        let sql = format!(
            "INSERT INTO \"{}\" (id, data, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            table
        );
        let started = Instant::now();
        sqlx::query(&sql)
            .bind(&id)
            .bind(serde_json::to_string(&data)?)
            .bind(created_by)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(|e| {
                if e.is_unique_violation() {
                    DatabaseError::Conflict(format!("{} '{}' already exists", name, id))
                } else {
                    e
                }
            })?;
        self.observe("insert", &table, started);

        Ok(EntityRecord {
            id,
            data,
            created_by: created_by.map(str::to_string),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update(&self, entity: &str, id: &str, body: Value) -> Result<EntityRecord, DatabaseError> {
        let (name, table) = self.table(entity).await?;
        let mut overlay = into_document(body)?;
        let EntityRecord { data, created_by, created_at, .. } =
            self.fetch(&table, id).await?.ok_or_else(|| not_found(&name, id))?;

        overlay.remove("id");
        let merged = shallow_merge(data, overlay);

        // updated_at comes from the database clock
        let sql = format!(
            "UPDATE \"{}\" SET data = ?, updated_at = {} WHERE id = ? RETURNING updated_at",
            table,
            DatabaseManager::sql_now()
        );
        let started = Instant::now();
        let stamped: Option<(String,)> = sqlx::query_as(&sql)
            .bind(serde_json::to_string(&merged)?)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.observe("update", &table, started);

        // Deleted between the read and the write
        let (updated_at,) = stamped.ok_or_else(|| not_found(&name, id))?;

        Ok(EntityRecord {
            id: id.to_string(),
            data: merged,
            created_by,
            created_at,
            updated_at,
        })
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), DatabaseError> {
        let (name, table) = self.table(entity).await?;
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", table);
        let started = Instant::now();
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        self.observe("delete", &table, started);

        if result.rows_affected() == 0 {
            return Err(not_found(&name, id));
        }
        Ok(())
    }
}
