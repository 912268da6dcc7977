use serde_json::Value;
use sqlx::{postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::{validate_identifier, Filter, SqlResult};

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;
type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>;

/// Runs a compiled `Filter` against Postgres.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(filter: Filter) -> Self {
        Self { filter, _phantom: std::marker::PhantomData }
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        log_query(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = self.filter.to_count_sql()?;
        log_query(&sql_result);
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

/// `INSERT` of a whole document. Postgres converts each JSON field to its
/// column type.
pub async fn insert_document<T>(pool: &PgPool, table: &str, document: &Value) -> Result<T, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    validate_identifier(table)?;
    let query = format!(
        "INSERT INTO \"{table}\" SELECT * FROM jsonb_populate_record(NULL::\"{table}\", $1) RETURNING *",
        table = table
    );
    let row = sqlx::query_as::<_, T>(&query).bind(document.clone()).fetch_one(pool).await?;
    Ok(row)
}

/// `UPDATE` of every non-id field of a document, matched by id.
pub async fn update_document<T>(pool: &PgPool, table: &str, id: Uuid, document: &Value) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    validate_identifier(table)?;
    let columns: Vec<String> = match document {
        Value::Object(obj) => obj.keys().filter(|k| k.as_str() != "id").cloned().collect(),
        _ => return Err(DatabaseError::QueryError("document must be a JSON object".to_string())),
    };
    for column in &columns {
        validate_identifier(column)?;
    }
    let column_list = columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ");
    let query = format!(
        "UPDATE \"{table}\" SET ({cols}) = (SELECT {cols} FROM jsonb_populate_record(NULL::\"{table}\", $1)) WHERE \"id\" = $2 RETURNING *",
        table = table,
        cols = column_list
    );
    let row = sqlx::query_as::<_, T>(&query).bind(document.clone()).bind(id).fetch_optional(pool).await?;
    Ok(row)
}

fn log_query(sql_result: &SqlResult) {
    if crate::config::config().filter.debug_logging {
        tracing::debug!("SQL: {} {:?}", sql_result.query, sql_result.params);
    }
}

fn bind_param_query<'q>(q: PgQuery<'q>, v: &'q Value) -> PgQuery<'q> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        // Ids travel as strings in filters; bind them as uuid so they compare with uuid columns
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => q.bind(id),
            Err(_) => q.bind(s.as_str()),
        },
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

fn bind_param_query_as<'q, O>(q: PgQueryAs<'q, O>, v: &'q Value) -> PgQueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => q.bind(id),
            Err(_) => q.bind(s.as_str()),
        },
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
