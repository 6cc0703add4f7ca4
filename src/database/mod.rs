pub mod document;
pub mod manager;
pub mod models;
pub mod registry;
pub mod repository;

pub use document::{Document, EntityRecord};
pub use manager::{DatabaseError, DatabaseManager};
pub use registry::{sanitize_entity_name, EntityRegistry};
pub use repository::{EntityStore, SqliteEntityStore};
