use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{validate_identifier, FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult, WhereNode};

/// A validated query over one table or collection.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        validate_identifier(&table_name)
            .map_err(|_| FilterError::InvalidTableName(format!("Invalid table name format: {}", table_name)))?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    pub fn from_data(table_name: impl Into<String>, data: FilterData) -> Result<Self, FilterError> {
        let mut filter = Self::new(table_name)?;
        filter.assign(data)?;
        Ok(filter)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        match (data.limit, data.offset) {
            (Some(limit), offset) => {
                self.limit(limit, offset)?;
            }
            (None, Some(offset)) => {
                self.offset(offset)?;
            }
            (None, None) => {}
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in columns.iter().filter(|c| c.as_str() != "*") {
            validate_identifier(column)?;
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn include_inactive(&mut self, include: bool) -> &mut Self {
        self.options.include_inactive = include;
        self
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidPaging("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            self.offset(off)?;
        }

        // Apply max limit from config
        let max_limit = crate::config::config().filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::config().filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        Ok(self)
    }

    pub fn offset(&mut self, offset: i32) -> Result<&mut Self, FilterError> {
        if offset < 0 {
            return Err(FilterError::InvalidPaging("Offset must be non-negative".to_string()));
        }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn options(&self) -> &FilterWhereOptions {
        &self.options
    }

    pub fn order_info(&self) -> &[FilterOrderInfo] {
        &self.order_data
    }

    pub fn page(&self) -> (Option<i32>, Option<i32>) {
        (self.limit, self.offset)
    }

    /// The parsed WHERE tree, without the implicit active-row condition.
    pub fn where_node(&self) -> Result<WhereNode, FilterError> {
        match &self.where_data {
            Some(where_data) => FilterWhere::parse(where_data),
            None => Ok(WhereNode::And(vec![])),
        }
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match &self.where_data {
            Some(where_data) => FilterWhere::generate(where_data, 0, &self.options)?,
            None => FilterWhere::generate_empty(&self.options),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_result.query);
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_select_with_order_and_page() {
        let filter = Filter::from_data(
            "classrooms",
            FilterData {
                where_clause: Some(json!({ "school_id": "abc" })),
                order: Some(json!("name asc")),
                limit: Some(10),
                offset: Some(20),
                ..Default::default()
            },
        )
        .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"classrooms\" WHERE \"is_active\" = true AND \"school_id\" = $1 ORDER BY \"name\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!("abc")]);
    }

    #[test]
    fn count_sql_respects_include_inactive() {
        let mut filter = Filter::new("students").unwrap();
        filter.include_inactive(true);
        assert_eq!(filter.to_count_sql().unwrap().query, "SELECT COUNT(*) as count FROM \"students\" WHERE 1=1");
    }

    #[test]
    fn rejects_bad_names_and_negative_pages() {
        assert!(matches!(Filter::new("schools; --"), Err(FilterError::InvalidTableName(_))));
        let mut filter = Filter::new("schools").unwrap();
        assert!(filter.limit(-1, None).is_err());
        assert!(filter.offset(-5).is_err());
        assert!(filter.select(vec!["name".into(), "bad col".into()]).is_err());
    }
}
