//! Query execution pipeline for db-ferry.
//!
//! This module isolates the connect/execute/normalize pipeline and the
//! result envelope from the backend clients.

pub mod executor;

#[allow(unused_imports)]
pub use executor::{list_databases, list_databases_with, run_query, run_query_with, QueryOptions};
