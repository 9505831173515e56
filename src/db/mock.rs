//! Mock database clients for testing.
//!
//! Provides in-memory implementations so the query pipeline can be tested
//! without a live server.

use super::{DatabaseClient, Row, RowSet, Value};
use crate::error::{FerryError, Result};
use async_trait::async_trait;

/// A mock database client that returns predefined results.
pub struct MockDatabaseClient {
    row_set: RowSet,
}

impl MockDatabaseClient {
    /// Creates a new mock client with a one-row canned result.
    pub fn new() -> Self {
        let mut row = Row::new();
        row.insert("result".to_string(), Value::String("ok".to_string()));
        Self {
            row_set: RowSet {
                columns: vec!["result".to_string()],
                rows: vec![row],
            },
        }
    }

    /// Creates a mock client that answers every statement with the given
    /// row set.
    pub fn with_row_set(row_set: RowSet) -> Self {
        Self { row_set }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<RowSet> {
        // Non-SELECT statements produce an empty result, mirroring a
        // cursor with no projection.
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            Ok(self.row_set.clone())
        } else {
            Ok(RowSet::default())
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// A mock database client whose statements always fail.
pub struct FailingDatabaseClient {
    error_message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client with the given backend diagnostic text.
    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<RowSet> {
        Err(FerryError::query_for(self.error_message.clone(), sql))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
