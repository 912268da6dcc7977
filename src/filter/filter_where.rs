use serde_json::Value;

use super::error::FilterError;
use super::types::{validate_identifier, FilterOp, FilterWhereInfo, FilterWhereOptions, WhereNode};

const ACTIVE_CONDITION: &str = "\"is_active\" = true";

/// Compiles a parsed WHERE tree into a Postgres predicate with `$n` params.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let node = Self::parse(where_data)?;
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.compile(&node)?;

        let mut sql_conditions = vec![];
        if !options.include_inactive {
            sql_conditions.push(ACTIVE_CONDITION.to_string());
        }
        if sql != "1=1" {
            sql_conditions.push(sql);
        }
        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, filter_where.param_values))
    }

    pub fn generate_empty(options: &FilterWhereOptions) -> (String, Vec<Value>) {
        let where_clause = if options.include_inactive { "1=1" } else { ACTIVE_CONDITION };
        (where_clause.to_string(), vec![])
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        Self::parse(where_data).map(|_| ())
    }

    /// Parses the JSON filter language. Multiple keys in one object are
    /// AND-ed; `null` matches everything.
    pub fn parse(where_data: &Value) -> Result<WhereNode, FilterError> {
        match where_data {
            Value::Null => Ok(WhereNode::And(vec![])),
            Value::Object(obj) => {
                let mut nodes = Vec::with_capacity(obj.len());
                for (key, value) in obj {
                    if key.starts_with('$') {
                        nodes.push(Self::parse_logical_operator(key, value)?);
                    } else {
                        Self::parse_field_condition(key, value, &mut nodes)?;
                    }
                }
                Ok(if nodes.len() == 1 { nodes.remove(0) } else { WhereNode::And(nodes) })
            }
            Value::String(_) => Err(FilterError::RawSql),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_logical_operator(op: &str, value: &Value) -> Result<WhereNode, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let children = arr.iter().map(Self::parse).collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { WhereNode::And(children) } else { WhereNode::Or(children) })
            }
            "$not" => Ok(WhereNode::Not(Box::new(Self::parse(value)?))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value, out: &mut Vec<WhereNode>) -> Result<(), FilterError> {
        validate_identifier(field)?;
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key)?;
                    Self::validate_operator_data(operator, op_val)?;
                    out.push(WhereNode::Condition(FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    }));
                }
            }
            // Implicit equality: { field: value }
            _ => out.push(WhereNode::Condition(FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            })),
        }
        Ok(())
    }

    fn validate_operator_data(operator: FilterOp, data: &Value) -> Result<(), FilterError> {
        match operator {
            FilterOp::Between => match data.as_array() {
                Some(values) if values.len() == 2 => Ok(()),
                _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
            FilterOp::Size if !data.is_u64() => {
                Err(FilterError::InvalidOperatorData("$size requires a non-negative integer".to_string()))
            }
            FilterOp::Like | FilterOp::ILike if !data.is_string() => {
                Err(FilterError::InvalidOperatorData("pattern operators require a string".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn compile(&mut self, node: &WhereNode) -> Result<String, FilterError> {
        match node {
            WhereNode::Condition(info) => self.build_sql_condition(info),
            WhereNode::And(children) | WhereNode::Or(children) => {
                let is_and = matches!(node, WhereNode::And(_));
                if children.is_empty() {
                    return Ok(if is_and { "1=1" } else { "1=0" }.to_string());
                }
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    parts.push(format!("({})", self.compile(child)?));
                }
                Ok(parts.join(if is_and { " AND " } else { " OR " }))
            }
            WhereNode::Not(inner) => Ok(format!("NOT ({})", self.compile(inner)?)),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = format!("\"{}\"", condition.column);
        let data = &condition.data;
        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", column),
            FilterOp::Eq => format!("{} = {}", column, self.param(data)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", column),
            FilterOp::Ne => format!("{} IS DISTINCT FROM {}", column, self.param(data)),
            FilterOp::Gt => format!("{} > {}", column, self.param(data)),
            FilterOp::Gte => format!("{} >= {}", column, self.param(data)),
            FilterOp::Lt => format!("{} < {}", column, self.param(data)),
            FilterOp::Lte => format!("{} <= {}", column, self.param(data)),
            FilterOp::Like => format!("{} LIKE {}", column, self.param(data)),
            FilterOp::ILike => format!("{} ILIKE {}", column, self.param(data)),
            FilterOp::In | FilterOp::NIn => {
                let values = Self::as_list(data);
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params = self.params(&values);
                format!("{} {}IN ({})", column, if negate { "NOT " } else { "" }, params)
            }
            FilterOp::Between => {
                let values = Self::as_list(data);
                format!("{} BETWEEN {} AND {}", column, self.param(&values[0]), self.param(&values[1]))
            }
            FilterOp::Any => {
                let values = Self::as_list(data);
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                format!("{} && ARRAY[{}]", column, self.params(&values))
            }
            FilterOp::All => {
                let values = Self::as_list(data);
                if values.is_empty() {
                    return Ok("1=1".to_string());
                }
                format!("{} @> ARRAY[{}]", column, self.params(&values))
            }
            FilterOp::Size => format!("COALESCE(cardinality({}), 0) = {}", column, self.param(data)),
        })
    }

    fn as_list(data: &Value) -> Vec<Value> {
        match data {
            Value::Array(values) => values.clone(),
            other => vec![other.clone()],
        }
    }

    fn params(&mut self, values: &[Value]) -> String {
        values.iter().map(|v| self.param(v)).collect::<Vec<_>>().join(", ")
    }

    fn param(&mut self, value: &Value) -> String {
        self.param_values.push(value.clone());
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_excludes_inactive() {
        let (sql, params) = FilterWhere::generate(&json!({ "name": "Room A" }), 0, &FilterWhereOptions::default()).unwrap();
        assert_eq!(sql, "\"is_active\" = true AND \"name\" = $1");
        assert_eq!(params, vec![json!("Room A")]);
    }

    #[test]
    fn include_inactive_drops_active_condition() {
        let options = FilterWhereOptions { include_inactive: true };
        let (sql, _) = FilterWhere::generate(&json!({ "email": "a@b.co" }), 0, &options).unwrap();
        assert_eq!(sql, "\"email\" = $1");
        assert_eq!(FilterWhere::generate_empty(&options).0, "1=1");
    }

    #[test]
    fn nested_logical_operators_number_params_in_order() {
        let where_data = json!({
            "$and": [
                { "school_id": "s1" },
                { "$or": [{ "name": { "$ilike": "%math%" } }, { "capacity": { "$gte": 30 } }] }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0, &FilterWhereOptions { include_inactive: true }).unwrap();
        assert_eq!(
            sql,
            "(\"school_id\" = $1) AND ((\"name\" ILIKE $2) OR (\"capacity\" >= $3))"
        );
        assert_eq!(params, vec![json!("s1"), json!("%math%"), json!(30)]);
    }

    #[test]
    fn in_with_empty_list_matches_nothing() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0, &FilterWhereOptions { include_inactive: true }).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn raw_sql_and_bad_identifiers_are_rejected() {
        assert!(FilterWhere::validate(&json!("1=1; DROP TABLE schools")).is_err());
        assert!(FilterWhere::validate(&json!({ "name\" OR 1=1 --": "x" })).is_err());
        assert!(FilterWhere::validate(&json!({ "name": { "$regex": ".*" } })).is_err());
        assert!(FilterWhere::validate(&json!({ "capacity": { "$between": [1] } })).is_err());
    }
}
