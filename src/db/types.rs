//! Query result types for db-ferry.
//!
//! Defines the canonical value set and the result envelope returned to
//! external callers. No driver-native type ever crosses this boundary.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A row of data: an ordered mapping from column name to value.
///
/// Insertion order follows the statement's projection order. When a
/// statement projects two columns with the same name, the later column
/// silently overwrites the earlier one (last write wins).
pub type Row = IndexMap<String, Value>;

/// Columns and rows produced by the executor, before the envelope is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column names in projection order. Duplicates pass through as-is.
    pub columns: Vec<String>,

    /// Normalized rows in cursor order.
    pub rows: Vec<Row>,
}

/// The result of executing a SQL statement, as handed to the external caller.
///
/// Constructed once per call and immediately returned; nothing is retained
/// between calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in projection order.
    pub columns: Vec<String>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Wall-clock time for the whole call (connect + execute + normalize),
    /// in milliseconds.
    pub elapsed_ms: u64,
}

impl QueryResult {
    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Represents a single value from a database query.
///
/// This is the closed set of value kinds the engine guarantees to produce,
/// independent of the source backend. Serialized untagged: `Null` becomes
/// JSON null, `Int`/`Float` become JSON numbers, `Timestamp` becomes an
/// RFC 3339 string, everything else becomes a JSON string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Point in time. Naive backend timestamps are interpreted as UTC.
    Timestamp(DateTime<Utc>),

    /// Text/string value.
    String(String),

    /// Binary payload reinterpreted as text. Lossy for non-UTF-8 payloads;
    /// invalid sequences are replaced, not base64-encoded.
    OpaqueText(String),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Reinterprets a raw byte payload as text.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Value::OpaqueText(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
            Value::String(s) => s.clone(),
            Value::OpaqueText(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Conversion implementations for common types
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::from_bytes(&v)
    }
}
