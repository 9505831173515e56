//! ferry - run ad-hoc SQL against heterogeneous database backends.

mod cli;
mod config;
mod db;
mod error;
mod query;

use cli::Cli;
use config::{Config, ConnectionConfig};
use error::{FerryError, Result};
use query::executor::{self, QueryOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load configuration file
    let config_path = cli.config_path();
    let config = Config::load_from_file(&config_path)?;

    // Build connection config with precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
        FerryError::config(
            "no connection configured; pass a connection string, --host, or --connection",
        )
    })?;

    info!("Connection: {}", connection.display_string());

    if cli.list_databases {
        let names = executor::list_databases(&connection).await?;
        print_json(&names)?;
        return Ok(());
    }

    let sql = cli.sql_text()?;
    let options = QueryOptions {
        timeout: cli.query_timeout(),
    };
    let result = executor::run_query(&connection, &sql, &options).await?;

    info!(
        "{} row(s) in {} ms",
        result.row_count(),
        result.elapsed_ms
    );
    print_json(&result)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| FerryError::internal(format!("failed to serialize result: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file,
/// and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Start with CLI connection config if provided
    let mut connection = cli.to_connection_config()?;

    // If no CLI connection, try named connection from config
    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(FerryError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    // If still no connection, try default from config
    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // Apply environment variable defaults
    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
