// handlers/entity/mod.rs - generic CRUD over /api/:entity
//
// Collection-level: list, create. Record-level: get, update, delete.
// The identity is optional everywhere; create stamps it as `created_by`.

pub mod collection;
pub mod record;

pub use collection::{create, list};
pub use record::{delete, get, update};
