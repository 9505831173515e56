//! Database abstraction layer for db-ferry.
//!
//! Provides a trait-based interface over the backend families, allowing
//! the query pipeline to treat them interchangeably.

mod mock;
mod mssql;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mssql::MssqlClient;
pub use postgres::{list_databases, PostgresClient};
pub use types::{QueryResult, Row, RowSet, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Mssql,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display and error tagging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mssql => "mssql",
        }
    }

    /// Parses a backend tag from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mssql" | "sqlserver" | "sql-server" => Some(Self::Mssql),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Mssql => 1433,
        }
    }
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens a database connection for the backend named in the configuration.
///
/// This is the central factory function for the query pipeline. Each call
/// opens its own transient connection; nothing is pooled or reused.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Mssql => {
            let client = MssqlClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// All operations are async and return Results with FerryError. A client
/// wraps exactly one live connection and must be closed (or dropped) before
/// the enclosing call returns.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a SQL statement verbatim and returns the ordered column
    /// list plus normalized rows.
    async fn execute_query(&mut self, sql: &str) -> Result<RowSet>;

    /// Closes the database connection.
    async fn close(self: Box<Self>) -> Result<()>;
}
