use regex::RegexBuilder;
use serde_json::Value;
use std::cmp::Ordering;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterOp, FilterWhereInfo, SortDirection, WhereNode};

/// Evaluates filters against JSON documents for the in-memory store. Mirrors
/// the SQL that `FilterWhere` generates.
pub struct FilterMatcher {
    node: WhereNode,
    include_inactive: bool,
}

impl FilterMatcher {
    pub fn new(filter: &Filter) -> Result<Self, FilterError> {
        Ok(Self { node: filter.where_node()?, include_inactive: filter.options().include_inactive })
    }

    pub fn matches(&self, doc: &Value) -> bool {
        if !self.include_inactive && doc.get("is_active") != Some(&Value::Bool(true)) {
            return false;
        }
        evaluate(&self.node, doc)
    }

    /// Filters, sorts, and pages `docs` the way the SQL query would.
    pub fn apply(filter: &Filter, docs: Vec<Value>) -> Result<Vec<Value>, FilterError> {
        let matcher = Self::new(filter)?;
        let mut rows: Vec<Value> = docs.into_iter().filter(|d| matcher.matches(d)).collect();

        let order = filter.order_info();
        if !order.is_empty() {
            rows.sort_by(|a, b| {
                for info in order {
                    let ordering = compare_sort(a.get(&info.column), b.get(&info.column));
                    let ordering = match info.sort {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let (limit, offset) = filter.page();
        let offset = offset.unwrap_or(0).max(0) as usize;
        let limit = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

fn evaluate(node: &WhereNode, doc: &Value) -> bool {
    match node {
        WhereNode::Condition(info) => evaluate_condition(info, doc),
        WhereNode::And(children) => children.iter().all(|c| evaluate(c, doc)),
        WhereNode::Or(children) => children.iter().any(|c| evaluate(c, doc)),
        WhereNode::Not(inner) => !evaluate(inner, doc),
    }
}

fn evaluate_condition(info: &FilterWhereInfo, doc: &Value) -> bool {
    let field = doc.get(&info.column).unwrap_or(&Value::Null);
    let data = &info.data;
    match info.operator {
        FilterOp::Eq => values_equal(field, data),
        FilterOp::Ne => !values_equal(field, data),
        FilterOp::Gt => compare(field, data) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(field, data), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(field, data) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(field, data), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like => like(field, data, false),
        FilterOp::ILike => like(field, data, true),
        FilterOp::In => list(data).iter().any(|v| values_equal(field, v)),
        FilterOp::NIn => !list(data).iter().any(|v| values_equal(field, v)),
        FilterOp::Between => {
            let bounds = list(data);
            bounds.len() == 2
                && matches!(compare(field, &bounds[0]), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare(field, &bounds[1]), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOp::Any => match field {
            Value::Array(items) => list(data).iter().any(|v| items.iter().any(|i| values_equal(i, v))),
            _ => false,
        },
        FilterOp::All => match field {
            Value::Array(items) => list(data).iter().all(|v| items.iter().any(|i| values_equal(i, v))),
            _ => false,
        },
        FilterOp::Size => {
            let len = field.as_array().map(|a| a.len()).unwrap_or(0) as u64;
            data.as_u64() == Some(len)
        }
    }
}

fn list(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// Nulls sort last, as in Postgres ascending order.
fn compare_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
    }
}

fn like(field: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Some(text), Some(pattern)) = (field.as_str(), pattern.as_str()) else {
        return false;
    };
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    RegexBuilder::new(&expr)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
