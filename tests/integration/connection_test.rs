//! Connection integration tests.
//!
//! Tests database connectivity and error handling.

use db_ferry::config::ConnectionConfig;
use db_ferry::db::DatabaseBackend;
use db_ferry::error::FerryError;
use db_ferry::query::executor::{run_query, QueryOptions};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to build a config from the test database URL.
fn get_test_config() -> Option<ConnectionConfig> {
    let url = get_test_database_url()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

#[tokio::test]
async fn test_connect_with_valid_credentials() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // The pipeline opens and closes its own connection; success means the
    // whole connect/execute/close cycle worked.
    let result = run_query(&config, "SELECT 1", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(result.row_count(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_host() {
    let config = ConnectionConfig {
        backend: DatabaseBackend::Postgres,
        host: Some("invalid.host.that.does.not.exist.local".to_string()),
        port: Some(5432),
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
    };

    let result = run_query(&config, "SELECT 1", &QueryOptions::default()).await;
    assert!(result.is_err());

    // Connection must fail before any statement executes.
    match result.unwrap_err() {
        FerryError::Connection { backend, .. } => assert_eq!(backend, "postgres"),
        other => panic!("Expected Connection error, got: {other:?}"),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_port() {
    let config = ConnectionConfig {
        backend: DatabaseBackend::Postgres,
        host: Some("127.0.0.1".to_string()),
        port: Some(1),
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
    };

    let result = run_query(&config, "SELECT 1", &QueryOptions::default()).await;
    assert!(matches!(
        result.unwrap_err(),
        FerryError::Connection { .. }
    ));
}

#[tokio::test]
async fn test_connect_with_bad_password() {
    let Some(mut config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    config.password = Some("definitely-not-the-password".to_string());

    let result = run_query(&config, "SELECT 1", &QueryOptions::default()).await;

    // A bad password surfaces as a connection failure, never as a query
    // failure: the statement must not have run.
    match result.unwrap_err() {
        FerryError::Connection { .. } => {}
        other => panic!("Expected Connection error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_with_unknown_database() {
    let Some(mut config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    config.database = Some("ferry_no_such_database_xyz".to_string());

    let result = run_query(&config, "SELECT 1", &QueryOptions::default()).await;
    match result.unwrap_err() {
        FerryError::Connection { message, .. } => {
            let message = message.to_lowercase();
            assert!(
                message.contains("does not exist") || message.contains("database"),
                "Expected database-not-found diagnostic, got: {message}"
            );
        }
        other => panic!("Expected Connection error, got: {other:?}"),
    }
}
