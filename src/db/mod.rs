//! Database access layer.
//!
//! This module provides:
//! - Connection pool admission (limit, FIFO wait queue, fail-fast policy)
//! - The MariaDB/MySQL driver binding
//! - Column type mappings to JSON

pub mod mysql;
pub mod pool;
pub mod types;

pub use mysql::{MySqlSession, MySqlSource};
pub use pool::{ConnectionPool, ConnectionSource, PooledConnection, SqlSession};
