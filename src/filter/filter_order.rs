use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection, SortKey};
use super::{is_valid_field_name, json_field_expr};

const COLUMN_KEYS: &[&str] = &["created_at", "updated_at"];

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `field`, `-field`, `created_at` or `-updated_at`.
    pub fn parse(sort: &str) -> Result<FilterOrderInfo, FilterError> {
        let trimmed = sort.trim();
        if trimmed.is_empty() {
            return Ok(FilterOrderInfo::default());
        }

        let (name, direction) = match trimmed.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (trimmed, SortDirection::Asc),
        };

        let key = if COLUMN_KEYS.contains(&name) {
            SortKey::Column(name.to_string())
        } else if is_valid_field_name(name) {
            SortKey::Field(name.to_string())
        } else {
            return Err(FilterError::InvalidSort(sort.to_string()));
        };

        Ok(FilterOrderInfo { key, sort: direction })
    }

    pub fn generate(info: &FilterOrderInfo) -> String {
        let target = match &info.key {
            SortKey::Column(column) => column.clone(),
            SortKey::Field(field) => json_field_expr(field),
        };
        format!("ORDER BY {} {}", target, info.sort.to_sql())
    }
}
