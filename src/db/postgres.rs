//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient`
//! trait for PostgreSQL databases using sqlx. One client wraps one plain
//! connection; there is no pool and nothing survives the call.

use crate::config::ConnectionConfig;
use crate::db::{DatabaseBackend, DatabaseClient, Row, RowSet, Value};
use crate::error::{FerryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use tracing::debug;

/// Fixed discovery statement. Ordering comes from the statement itself,
/// not from the engine.
const LIST_DATABASES_SQL: &str =
    "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname";

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    conn: PgConnection,
}

impl PostgresClient {
    /// Opens a single connection from the given configuration.
    ///
    /// One attempt only: transient failures surface directly to the caller,
    /// who decides whether to retry.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(config.host.as_deref().unwrap_or("localhost"))
            .port(config.port());

        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(database) = &config.database {
            options = options.database(database);
        }

        debug!(
            "connecting to postgres at {}:{}",
            config.host.as_deref().unwrap_or("localhost"),
            config.port()
        );

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| connection_error(e))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&mut self, sql: &str) -> Result<RowSet> {
        // Prepare first so the ordered column list is known even for a
        // statement that produces no rows.
        let statement = self
            .conn
            .prepare(sql)
            .await
            .map_err(|e| FerryError::query_for(e.to_string(), sql))?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut stream = self.conn.fetch(sql);

        // Lazy pull: one row at a time until the cursor is exhausted. The
        // stream's final error item is the terminal cursor state and fails
        // the whole call even when every row before it decoded.
        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| fetch_error(e, sql))?
        {
            rows.push(convert_row(&row)?);
        }

        debug!("query produced {} row(s)", rows.len());

        Ok(RowSet { columns, rows })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| FerryError::internal(format!("failed to close connection: {e}")))
    }
}

/// Lists non-template databases on the server, ascending by name.
///
/// Always connects to the fixed `postgres` maintenance database; the
/// `database` field of the configuration is ignored.
pub async fn list_databases(config: &ConnectionConfig) -> Result<Vec<String>> {
    let mut admin = config.clone();
    admin.database = Some("postgres".to_string());

    let client = PostgresClient::connect(&admin).await?;
    let mut conn = client.conn;

    let result = sqlx::query_scalar::<_, String>(LIST_DATABASES_SQL)
        .fetch_all(&mut conn)
        .await
        .map_err(|e| FerryError::query_for(e.to_string(), LIST_DATABASES_SQL));

    if let Err(e) = conn.close().await {
        debug!("error closing discovery connection: {e}");
    }

    result
}

fn connection_error(error: sqlx::Error) -> FerryError {
    FerryError::connection(DatabaseBackend::Postgres.as_str(), error.to_string())
}

/// Splits cursor errors into the two failure kinds: decoding problems are
/// scan errors, everything else (server-side failure mid-execution) is a
/// query error.
fn fetch_error(error: sqlx::Error, sql: &str) -> FerryError {
    match error {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            FerryError::scan(error.to_string())
        }
        other => FerryError::query_for(other.to_string(), sql),
    }
}

/// Converts a sqlx PgRow into the canonical row mapping.
///
/// Duplicate column names follow last-write-wins, matching the mapping
/// semantics of the result envelope.
fn convert_row(row: &PgRow) -> Result<Row> {
    let mut out = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = convert_value(row, index, column.type_info().name())?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

/// Converts a single column value from a PgRow to a canonical Value.
///
/// A cell that cannot be decoded is a scan error and aborts the whole call.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .map_err(scan_error)?
            .map(Value::Bool),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .map_err(scan_error)?
            .map(|v| Value::Int(v as i64)),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .map_err(scan_error)?
            .map(|v| Value::Int(v as i64)),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .map_err(scan_error)?
            .map(Value::Int),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .map_err(scan_error)?
            .map(|v| Value::Float(v as f64)),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .map_err(scan_error)?
            .map(Value::Float),

        // Kept textual so arbitrary precision survives the boundary.
        "NUMERIC" | "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .map_err(scan_error)?
            .map(|v| Value::String(v.to_string())),

        // Raw byte payloads are reinterpreted as text, not base64. Lossy
        // for non-UTF-8 data.
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map_err(scan_error)?
            .map(|bytes| Value::from_bytes(&bytes)),

        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map_err(scan_error)?
            .map(|dt| Value::Timestamp(dt.and_utc())),

        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map_err(scan_error)?
            .map(Value::Timestamp),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map_err(scan_error)?
            .map(|d| Value::String(d.to_string())),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map_err(scan_error)?
            .map(|t| Value::String(t.to_string())),

        // Everything else rides through on the textual fallback.
        _ => return fallback_value(row, index),
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Textual fallback for types without a dedicated mapping (uuid, json,
/// intervals, enums, arrays, ...). Tries a plain string decode first, then
/// falls back to the raw wire text, and finally to lossy byte
/// reinterpretation.
fn fallback_value(row: &PgRow, index: usize) -> Result<Value> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value.map(Value::String).unwrap_or(Value::Null));
    }

    let raw = row.try_get_raw(index).map_err(scan_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(text) = raw.as_str() {
        return Ok(Value::String(text.to_string()));
    }

    let bytes = raw.as_bytes().map_err(|e| FerryError::scan(e.to_string()))?;
    Ok(Value::from_bytes(bytes))
}

fn scan_error(error: sqlx::Error) -> FerryError {
    FerryError::scan(error.to_string())
}
