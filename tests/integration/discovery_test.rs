//! Database discovery integration tests.
//!
//! Tests the fixed administrative query that enumerates databases.

use db_ferry::config::ConnectionConfig;
use db_ferry::query::executor::list_databases;

/// Helper to build a config from the test database URL.
fn get_test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

#[tokio::test]
async fn test_list_databases_returns_sorted_names() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let names = list_databases(&config).await.unwrap();

    assert!(!names.is_empty(), "Expected at least one database");

    // Ordering comes from the discovery statement itself.
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted, "Expected names in ascending order");
}

#[tokio::test]
async fn test_list_databases_excludes_templates() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let names = list_databases(&config).await.unwrap();

    assert!(!names.contains(&"template0".to_string()));
    assert!(!names.contains(&"template1".to_string()));
}

#[tokio::test]
async fn test_list_databases_ignores_target_database() {
    let Some(mut config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Discovery goes through the fixed maintenance database no matter what
    // the config says, so a bogus target must not break it.
    config.database = Some("ferry_no_such_database_xyz".to_string());

    let names = list_databases(&config).await.unwrap();
    assert!(!names.is_empty());
}
