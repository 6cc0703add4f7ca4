pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use filter::Filter;

/// Field names that may be spliced into a JSON path literal.
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `json_extract` expression for a validated document field.
pub fn json_field_expr(field: &str) -> String {
    format!("json_extract(data, '$.{}')", field)
}
