//! Error types for db-ferry.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for db-ferry operations.
#[derive(Error, Debug)]
pub enum FerryError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error ({backend}): {message}")]
    Connection { backend: String, message: String },

    /// Query execution errors (syntax errors, permission errors, server-side
    /// failures), carrying the offending statement where available.
    #[error("Query error: {message}")]
    Query {
        message: String,
        statement: Option<String>,
    },

    /// Row or terminal cursor decoding errors after execution began.
    /// Fatal to the whole call: no partial results are returned.
    #[error("Scan error: {0}")]
    Scan(String),

    /// Configuration errors (invalid connection string, bad config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FerryError {
    /// Creates a connection error for the given backend tag.
    pub fn connection(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a query error with no attached statement.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            statement: None,
        }
    }

    /// Creates a query error carrying the offending statement.
    pub fn query_for(message: impl Into<String>, statement: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            statement: Some(statement.into()),
        }
    }

    /// Creates a scan error with the given message.
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan(message.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "Connection Error",
            Self::Query { .. } => "Query Error",
            Self::Scan(_) => "Scan Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using FerryError.
pub type Result<T> = std::result::Result<T, FerryError>;
