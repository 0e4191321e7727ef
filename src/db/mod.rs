//! SQLite storage: connection pool, file-based migrations and the query
//! functions that make up the data retrieval layer.

pub mod migrations;
pub mod pool;
pub mod queries;

pub use pool::{create_in_memory_pool, create_pool, DbPool};
