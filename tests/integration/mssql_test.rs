//! SQL Server query integration tests.
//!
//! Tests statement execution and normalization against the TDS backend.

use db_ferry::config::ConnectionConfig;
use db_ferry::db::Value;
use db_ferry::error::FerryError;
use db_ferry::query::executor::{run_query, QueryOptions};

/// Helper to build a config from the test server URL.
fn get_test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("MSSQL_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: MSSQL_URL not set");
        return;
    };

    let result = run_query(
        &config,
        "SELECT 1 AS num, 'hello' AS greeting",
        &QueryOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.columns, vec!["num", "greeting"]);
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0].get("num"), Some(&Value::Int(1)));
    assert_eq!(
        result.rows[0].get("greeting"),
        Some(&Value::String("hello".to_string()))
    );
}

#[tokio::test]
async fn test_null_normalizes_to_canonical_null() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: MSSQL_URL not set");
        return;
    };

    let result = run_query(
        &config,
        "SELECT 1 AS a, NULL AS b",
        &QueryOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.columns, vec!["a", "b"]);
    assert_eq!(result.rows[0].get("b"), Some(&Value::Null));
}

#[tokio::test]
async fn test_duplicate_column_names_last_write_wins() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: MSSQL_URL not set");
        return;
    };

    let result = run_query(&config, "SELECT 1 AS x, 2 AS x", &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["x", "x"]);
    assert_eq!(result.rows[0].len(), 1);
    assert_eq!(result.rows[0].get("x"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn test_binary_reinterpreted_as_text() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: MSSQL_URL not set");
        return;
    };

    let result = run_query(
        &config,
        "SELECT CAST('hello' AS VARBINARY(16)) AS payload",
        &QueryOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        result.rows[0].get("payload"),
        Some(&Value::OpaqueText("hello".to_string()))
    );
}

#[tokio::test]
async fn test_syntax_error_yields_query_error() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: MSSQL_URL not set");
        return;
    };

    let result = run_query(&config, "SELEC 1", &QueryOptions::default()).await;
    assert!(matches!(result.unwrap_err(), FerryError::Query { .. }));
}

#[tokio::test]
async fn test_bad_password_yields_connection_error() {
    let Some(mut config) = get_test_config() else {
        eprintln!("Skipping test: MSSQL_URL not set");
        return;
    };
    config.password = Some("definitely-not-the-password".to_string());

    let result = run_query(&config, "SELECT 1", &QueryOptions::default()).await;
    match result.unwrap_err() {
        FerryError::Connection { backend, .. } => assert_eq!(backend, "mssql"),
        other => panic!("Expected Connection error, got: {other:?}"),
    }
}
