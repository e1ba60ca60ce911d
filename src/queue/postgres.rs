//! sqlx PostgreSQL executor
//!
//! [`PgExecutor`] runs each statement on a connection from a `PgPool`.
//! Arguments are bound with their natural PostgreSQL types and result
//! columns are decoded by their PostgreSQL type name.
//!
//! Batch cursors only live inside one transaction. Because every call here
//! may land on a different pooled connection, walking a cursor with
//! `fetch_cursor` needs an executor pinned to one transaction instead.

use crate::queue::executor::{BackendError, BackendResult, Row, SqlExecutor, Value};
use crate::queue::interval::Interval;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};

#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> BackendResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(BackendError::new)?;
        log::debug!("Connected to PostgreSQL (max {} connections)", max_connections);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(x) => query.bind(*x),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Timestamp(t) => query.bind(*t),
            Value::Interval(i) => query.bind(PgInterval {
                months: i.months,
                days: i.days,
                microseconds: i.microseconds,
            }),
        };
    }
    query
}

fn decode_column(row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
    let type_name = row.column(index).type_info().name();
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|v| Value::Int(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|v| Value::Int(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| Value::Float(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::Float),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(Value::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|t| Value::Timestamp(t.and_utc())),
        "INTERVAL" => row
            .try_get::<Option<PgInterval>, _>(index)?
            .map(|i| Value::Interval(Interval::new(i.months, i.days, i.microseconds))),
        "VOID" => None,
        _ => row.try_get::<Option<String>, _>(index)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn decode_row(row: &PgRow) -> BackendResult<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal()).map_err(BackendError::new)?;
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

fn first_value(row: &PgRow) -> BackendResult<Value> {
    if row.columns().is_empty() {
        return Ok(Value::Null);
    }
    decode_column(row, 0).map_err(BackendError::new)
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute(&self, sql: &str, params: &[Value]) -> BackendResult<u64> {
        let result = bind(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(BackendError::new)?;
        Ok(result.rows_affected())
    }

    async fn select_all(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>> {
        let rows = bind(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(BackendError::new)?;
        rows.iter().map(decode_row).collect()
    }

    async fn select_one(&self, sql: &str, params: &[Value]) -> BackendResult<Option<Row>> {
        let row = bind(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(BackendError::new)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn select_value(&self, sql: &str, params: &[Value]) -> BackendResult<Value> {
        let row = bind(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(BackendError::new)?;
        match row {
            Some(row) => first_value(&row),
            None => Ok(Value::Null),
        }
    }

    async fn select_values(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Value>> {
        let rows = bind(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(BackendError::new)?;
        rows.iter().map(first_value).collect()
    }
}
