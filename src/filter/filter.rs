use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, FilterWhereInfo, SqlParam, SqlResult, LIMIT_KEY, SORT_KEY};

/// Listing query over one entity table, assembled from query-string pairs.
pub struct Filter {
    table_name: String,
    where_data: Vec<FilterWhereInfo>,
    order_data: FilterOrderInfo,
    limit: Option<u32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            where_data: vec![],
            order_data: FilterOrderInfo::default(),
            limit: None,
        })
    }

    /// Every pair except `sort`/`limit` becomes an equality predicate.
    pub fn from_query(
        table_name: impl Into<String>,
        pairs: &[(String, String)],
        max_limit: Option<u32>,
    ) -> Result<Self, FilterError> {
        let mut filter = Self::new(table_name)?;
        for (key, value) in pairs {
            match key.as_str() {
                SORT_KEY => {
                    filter.order(value)?;
                }
                LIMIT_KEY => {
                    filter.limit(value, max_limit)?;
                }
                _ => {
                    filter.where_eq(key, value)?;
                }
            }
        }
        Ok(filter)
    }

    pub fn where_eq(&mut self, field: &str, value: &str) -> Result<&mut Self, FilterError> {
        self.where_data.push(FilterWhere::parse(field, value)?);
        Ok(self)
    }

    pub fn order(&mut self, sort: &str) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::parse(sort)?;
        Ok(self)
    }

    pub fn limit(&mut self, raw: &str, max_limit: Option<u32>) -> Result<&mut Self, FilterError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.limit = None;
            return Ok(self);
        }
        let limit: u32 = trimmed
            .parse()
            .map_err(|_| FilterError::InvalidLimit(format!("'{}' is not a non-negative integer", raw)))?;

        let applied = match max_limit {
            Some(max) if limit > max => {
                tracing::debug!("Limit {} exceeds max {}, capping to max", limit, max);
                max
            }
            _ => limit,
        };
        self.limit = Some(applied);
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, mut params) = FilterWhere::generate(&self.where_data);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = match self.limit {
            Some(limit) => {
                params.push(SqlParam::Integer(i64::from(limit)));
                "LIMIT ?".to_string()
            }
            None => String::new(),
        };

        let query = [
            "SELECT id, data, created_by, created_at, updated_at".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn bare_listing_orders_by_created_at_desc() {
        let sql = Filter::from_query("entity_Lead", &[], None).unwrap().to_sql();
        assert_eq!(
            sql.query,
            "SELECT id, data, created_by, created_at, updated_at FROM \"entity_Lead\" ORDER BY created_at DESC"
        );
        assert!(sql.params.is_empty());
    }

    #[test]
    fn filters_sort_and_limit_combine() {
        let sql = Filter::from_query(
            "entity_Application",
            &pairs(&[("status", "submitted"), ("sort", "-updated_at"), ("limit", "2")]),
            None,
        )
        .unwrap()
        .to_sql();

        assert_eq!(
            sql.query,
            "SELECT id, data, created_by, created_at, updated_at FROM \"entity_Application\" \
             WHERE json_extract(data, '$.status') = ? ORDER BY updated_at DESC LIMIT ?"
        );
        assert_eq!(
            sql.params,
            vec![SqlParam::Text("submitted".into()), SqlParam::Integer(2)]
        );
    }

    #[test]
    fn limit_is_capped_by_max() {
        let sql = Filter::from_query("entity_Lead", &pairs(&[("limit", "5000")]), Some(100))
            .unwrap()
            .to_sql();
        assert_eq!(sql.params, vec![SqlParam::Integer(100)]);
    }

    #[test]
    fn non_numeric_limit_is_rejected() {
        let err = Filter::from_query("entity_Lead", &pairs(&[("limit", "ten")]), None).err();
        assert!(matches!(err, Some(FilterError::InvalidLimit(_))));
        let err = Filter::from_query("entity_Lead", &pairs(&[("limit", "-1")]), None).err();
        assert!(matches!(err, Some(FilterError::InvalidLimit(_))));
    }

    #[test]
    fn values_are_never_interpolated() {
        let sql = Filter::from_query("entity_Lead", &pairs(&[("email", "x' OR '1'='1")]), None)
            .unwrap()
            .to_sql();
        assert!(!sql.query.contains("OR '1'"));
        assert_eq!(sql.params, vec![SqlParam::Text("x' OR '1'='1".into())]);
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("entity_x\"; DROP").is_err());
        assert!(Filter::new("").is_err());
    }
}
