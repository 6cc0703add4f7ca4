/// Query-string keys that control the listing instead of filtering it.
pub const SORT_KEY: &str = "sort";
pub const LIMIT_KEY: &str = "limit";

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Physical envelope column (`created_at` / `updated_at`)
    Column(String),
    /// Field extracted from the document
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub key: SortKey,
    pub sort: SortDirection,
}

impl Default for FilterOrderInfo {
    fn default() -> Self {
        Self {
            key: SortKey::Column("created_at".to_string()),
            sort: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Bound value for a generated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
