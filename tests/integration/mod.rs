//! Integration tests for db-ferry.
//!
//! These tests require running database servers. Set DATABASE_URL (Postgres)
//! and/or MSSQL_URL (SQL Server) environment variables to run them.

pub mod connection_test;
pub mod discovery_test;
pub mod mssql_test;
