//! SQL Server database client implementation.
//!
//! Provides the `MssqlClient` struct that implements the `DatabaseClient`
//! trait for SQL Server databases using tiberius over a tokio TCP stream.
//! Like the Postgres client, one client wraps one transient connection.

use crate::config::ConnectionConfig;
use crate::db::{DatabaseBackend, DatabaseClient, Row, RowSet, Value};
use crate::error::{FerryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// SQL Server database client.
#[derive(Debug)]
pub struct MssqlClient {
    client: Client<Compat<TcpStream>>,
}

impl MssqlClient {
    /// Opens a single connection from the given configuration.
    ///
    /// The server's certificate is trusted without validation, the same
    /// posture as an ad-hoc client pointed at a dev or intranet server.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut tds = Config::new();
        tds.host(config.host.as_deref().unwrap_or("localhost"));
        tds.port(config.port());
        if let Some(database) = &config.database {
            tds.database(database);
        }
        tds.authentication(AuthMethod::sql_server(
            config.user.as_deref().unwrap_or_default(),
            config.password.as_deref().unwrap_or_default(),
        ));
        tds.trust_cert();

        debug!(
            "connecting to sql server at {}:{}",
            config.host.as_deref().unwrap_or("localhost"),
            config.port()
        );

        let tcp = TcpStream::connect(tds.get_addr())
            .await
            .map_err(|e| connection_error(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| connection_error(e.to_string()))?;

        let client = Client::connect(tds, tcp.compat_write())
            .await
            .map_err(|e| connection_error(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DatabaseClient for MssqlClient {
    async fn execute_query(&mut self, sql: &str) -> Result<RowSet> {
        let mut stream = self
            .client
            .query(sql, &[])
            .await
            .map_err(|e| query_error(e, sql))?;

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::new();
        let mut saw_metadata = false;

        // Lazy pull over the TDS token stream. The column list arrives as a
        // metadata item ahead of the rows, so it is known even when the
        // statement produces no rows. Only the first result set is consumed.
        while let Some(item) = stream.try_next().await.map_err(|e| stream_error(e, sql))? {
            match item {
                QueryItem::Metadata(meta) => {
                    if saw_metadata {
                        break;
                    }
                    saw_metadata = true;
                    columns = meta
                        .columns()
                        .iter()
                        .map(|col| col.name().to_string())
                        .collect();
                }
                QueryItem::Row(row) => rows.push(convert_row(row)?),
            }
        }

        debug!("query produced {} row(s)", rows.len());

        Ok(RowSet { columns, rows })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| FerryError::internal(format!("failed to close connection: {e}")))
    }
}

fn connection_error(message: String) -> FerryError {
    FerryError::connection(DatabaseBackend::Mssql.as_str(), message)
}

fn query_error(error: tiberius::error::Error, sql: &str) -> FerryError {
    FerryError::query_for(error.to_string(), sql)
}

/// Errors on the open cursor: server-raised errors are query failures,
/// anything else (protocol or token decoding trouble) is a scan failure.
fn stream_error(error: tiberius::error::Error, sql: &str) -> FerryError {
    match error {
        tiberius::error::Error::Server(_) => query_error(error, sql),
        other => FerryError::scan(other.to_string()),
    }
}

/// Converts a tiberius row into the canonical row mapping, applying
/// last-write-wins for duplicate column names.
fn convert_row(row: tiberius::Row) -> Result<Row> {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    let mut out = Row::with_capacity(names.len());
    for (name, data) in names.into_iter().zip(row.into_iter()) {
        out.insert(name, convert_value(data)?);
    }
    Ok(out)
}

/// Converts one TDS cell into a canonical Value.
fn convert_value(data: ColumnData<'static>) -> Result<Value> {
    let value = match data {
        ColumnData::Bit(v) => v.map(Value::Bool),
        ColumnData::U8(v) => v.map(|n| Value::Int(n as i64)),
        ColumnData::I16(v) => v.map(|n| Value::Int(n as i64)),
        ColumnData::I32(v) => v.map(|n| Value::Int(n as i64)),
        ColumnData::I64(v) => v.map(Value::Int),
        ColumnData::F32(v) => v.map(|n| Value::Float(n as f64)),
        ColumnData::F64(v) => v.map(Value::Float),

        // Kept textual so arbitrary precision survives the boundary.
        ColumnData::Numeric(v) => v.map(|n| Value::String(n.to_string())),

        ColumnData::String(v) => v.map(|s| Value::String(s.into_owned())),
        ColumnData::Guid(v) => v.map(|g| Value::String(g.to_string())),
        ColumnData::Xml(v) => v.map(|x| Value::String(x.to_string())),

        // Raw byte payloads are reinterpreted as text, not base64. Lossy
        // for non-UTF-8 data.
        ColumnData::Binary(v) => v.map(|b| Value::from_bytes(&b)),

        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)
                .map_err(|e| FerryError::scan(e.to_string()))?
                .map(|dt| Value::Timestamp(dt.and_utc()))
        }
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(&data)
            .map_err(|e| FerryError::scan(e.to_string()))?
            .map(Value::Timestamp),
        ColumnData::Date(_) => NaiveDate::from_sql(&data)
            .map_err(|e| FerryError::scan(e.to_string()))?
            .map(|d| Value::String(d.to_string())),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)
            .map_err(|e| FerryError::scan(e.to_string()))?
            .map(|t| Value::String(t.to_string())),
    };

    Ok(value.unwrap_or(Value::Null))
}
