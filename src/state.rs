use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::models::UserStore;
use crate::database::{EntityStore, SqliteEntityStore};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: SqlitePool,
    pub entities: Arc<dyn EntityStore>,
    pub users: Arc<UserStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let entities = SqliteEntityStore::new(pool.clone(), &config);
        Self {
            config: Arc::new(config),
            users: Arc::new(UserStore::new(pool.clone())),
            entities: Arc::new(entities),
            pool,
        }
    }
}
