use super::error::FilterError;
use super::types::{FilterWhereInfo, SqlParam};
use super::{is_valid_field_name, json_field_expr};

pub struct FilterWhere;

impl FilterWhere {
    pub fn parse(field: &str, value: &str) -> Result<FilterWhereInfo, FilterError> {
        if !is_valid_field_name(field) {
            return Err(FilterError::InvalidField(field.to_string()));
        }
        Ok(FilterWhereInfo { field: field.to_string(), value: value.to_string() })
    }

    /// AND of string equality predicates; empty input yields an empty clause.
    pub fn generate(infos: &[FilterWhereInfo]) -> (String, Vec<SqlParam>) {
        let conditions: Vec<String> = infos
            .iter()
            .map(|i| format!("{} = ?", json_field_expr(&i.field)))
            .collect();
        let params = infos.iter().map(|i| SqlParam::Text(i.value.clone())).collect();
        (conditions.join(" AND "), params)
    }
}
