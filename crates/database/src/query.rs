use futures::TryStreamExt;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Either, Executor, PgConnection, PgPool, Postgres, Row, TypeInfo};
use std::fmt;

/// A positional statement argument, bound to `$1`, `$2`, ... in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(JsonValue),
}

impl From<bool> for SqlArg {
    fn from(v: bool) -> Self {
        SqlArg::Bool(v)
    }
}

impl From<i32> for SqlArg {
    fn from(v: i32) -> Self {
        SqlArg::Int(v.into())
    }
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        SqlArg::Int(v)
    }
}

impl From<f64> for SqlArg {
    fn from(v: f64) -> Self {
        SqlArg::Float(v)
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Text(v.to_string())
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Text(v)
    }
}

impl From<JsonValue> for SqlArg {
    fn from(v: JsonValue) -> Self {
        SqlArg::Json(v)
    }
}

impl<T: Into<SqlArg>> From<Option<T>> for SqlArg {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlArg::Null, Into::into)
    }
}

/// The outcome of one statement.
///
/// `row_count` follows the server's command tag: rows returned for a
/// `SELECT`, rows affected for `INSERT`/`UPDATE`/`DELETE`.
#[derive(Default)]
pub struct ResultSet {
    pub row_count: u64,
    pub rows: Vec<PgRow>,
}

impl ResultSet {
    /// Renders every row as a JSON object keyed by column name.
    pub fn to_json(&self) -> Vec<JsonValue> {
        self.rows.iter().map(row_to_json).collect()
    }
}

impl fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("row_count", &self.row_count)
            .field("rows", &self.rows.len())
            .finish()
    }
}

/// Leases a connection from `pool`, runs `sql` with `args`, and gives the
/// connection back before returning.
///
/// Any failure, whether leasing timed out or the statement was rejected, is
/// logged here and then returned to the caller unchanged. Nothing is retried.
pub async fn query(
    pool: &PgPool,
    sql: &str,
    args: Vec<SqlArg>,
) -> Result<ResultSet, sqlx::Error> {
    let outcome = match pool.acquire().await {
        Ok(mut conn) => {
            let outcome = execute(&mut conn, sql, args).await;
            // Release the lease on every path before the outcome is inspected.
            drop(conn);
            outcome
        }
        Err(e) => Err(e),
    };

    outcome.inspect_err(|e| tracing::error!(error = %e, sql, "Query failed."))
}

async fn execute(
    conn: &mut PgConnection,
    sql: &str,
    args: Vec<SqlArg>,
) -> Result<ResultSet, sqlx::Error> {
    let mut stream = conn.fetch_many(bind_all(sqlx::query(sql), args));

    let mut result = ResultSet::default();
    while let Some(step) = stream.try_next().await? {
        match step {
            Either::Left(done) => result.row_count += done.rows_affected(),
            Either::Right(row) => result.rows.push(row),
        }
    }
    Ok(result)
}

fn row_to_json(row: &PgRow) -> JsonValue {
    let mut object = serde_json::Map::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), cell_to_json(row, idx));
    }
    JsonValue::Object(object)
}

fn cell_to_json(row: &PgRow, idx: usize) -> JsonValue {
    let type_name = row.columns()[idx].type_info().name();
    let cell = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map(|v| v.map(JsonValue::from)),
        "INT2" => row.try_get::<Option<i16>, _>(idx).map(|v| v.map(JsonValue::from)),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map(|v| v.map(JsonValue::from)),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map(|v| v.map(JsonValue::from)),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(|v| v.map(JsonValue::from)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(|v| v.map(JsonValue::from)),
        "JSON" | "JSONB" => row.try_get::<Option<JsonValue>, _>(idx),
        _ => row.try_get::<Option<String>, _>(idx).map(|v| v.map(JsonValue::from)),
    };

    match cell {
        Ok(Some(value)) => value,
        Ok(None) => JsonValue::Null,
        // Types without a JSON mapping are shown by name.
        Err(_) => JsonValue::String(format!("<{}>", type_name.to_lowercase())),
    }
}

fn bind_all(
    mut query: Query<'_, Postgres, PgArguments>,
    args: Vec<SqlArg>,
) -> Query<'_, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            SqlArg::Null => query.bind(None::<String>),
            SqlArg::Bool(v) => query.bind(v),
            SqlArg::Int(v) => query.bind(v),
            SqlArg::Float(v) => query.bind(v),
            SqlArg::Text(v) => query.bind(v),
            SqlArg::Json(v) => query.bind(v),
        };
    }
    query
}
