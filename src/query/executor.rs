//! Query execution pipeline.
//!
//! One call is one linear pipeline: open a transient connection, run the
//! caller's statement verbatim, normalize the rows, wrap the result with
//! the measured wall-clock time, and release the connection on every exit
//! path. Nothing is retained between calls.

use std::time::{Duration, Instant};

use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseBackend, DatabaseClient, QueryResult};
use crate::error::{FerryError, Result};
use tracing::debug;

/// Per-call execution options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Abort the call when it runs longer than this. `None` blocks for as
    /// long as the backend takes, which is the historical behavior.
    pub timeout: Option<Duration>,
}

/// Runs a SQL statement against the backend named in the configuration and
/// returns the normalized result envelope.
pub async fn run_query(
    config: &ConnectionConfig,
    sql: &str,
    options: &QueryOptions,
) -> Result<QueryResult> {
    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, run_pipeline(config, sql))
            .await
            .map_err(|_| {
                FerryError::query_for(
                    format!("query timed out after {:.1}s", limit.as_secs_f64()),
                    sql,
                )
            })?,
        None => run_pipeline(config, sql).await,
    }
}

/// Runs a SQL statement from the plain-string arguments of the external
/// interface: a backend tag, connection parts, and the statement text.
pub async fn run_query_with(
    backend: &str,
    host: &str,
    user: &str,
    password: &str,
    database: &str,
    sql: &str,
) -> Result<QueryResult> {
    let backend = DatabaseBackend::parse(backend)
        .ok_or_else(|| FerryError::config(format!("unknown backend '{backend}'")))?;
    let config = ConnectionConfig::from_parts(backend, host, user, password, Some(database));
    run_query(&config, sql, &QueryOptions::default()).await
}

/// Lists the databases on a Postgres-family server, ascending by name.
pub async fn list_databases(config: &ConnectionConfig) -> Result<Vec<String>> {
    if config.backend != DatabaseBackend::Postgres {
        return Err(FerryError::config(format!(
            "database discovery is only available for postgres, not {}",
            config.backend
        )));
    }
    db::list_databases(config).await
}

/// Database discovery from the plain-string arguments of the external
/// interface. No target database is taken; the fixed maintenance database
/// is used.
pub async fn list_databases_with(host: &str, user: &str, password: &str) -> Result<Vec<String>> {
    let config = ConnectionConfig::from_parts(DatabaseBackend::Postgres, host, user, password, None);
    list_databases(&config).await
}

async fn run_pipeline(config: &ConnectionConfig, sql: &str) -> Result<QueryResult> {
    // The clock starts before the connector so the envelope reports the
    // cost of the whole call, not just the statement.
    let start = Instant::now();
    let client = db::connect(config).await?;
    execute_and_wrap(client, sql, start).await
}

/// Executes the statement on an open client and assembles the envelope.
/// The client is closed before returning on both the success and the
/// failure path.
async fn execute_and_wrap(
    mut client: Box<dyn DatabaseClient>,
    sql: &str,
    start: Instant,
) -> Result<QueryResult> {
    let outcome = client.execute_query(sql).await;

    if let Err(e) = client.close().await {
        debug!("error closing connection: {e}");
    }

    let row_set = outcome?;
    Ok(QueryResult {
        columns: row_set.columns,
        rows: row_set.rows,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}
