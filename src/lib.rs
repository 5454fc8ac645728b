//! MariaDB MCP Server Library
//!
//! Exposes a MariaDB/MySQL server to MCP clients through six tools: `execute_sql`,
//! `list_tables`, `describe_table`, `list_databases`, `switch_database` and
//! `get_current_database`. Calls share a bounded connection pool and a selected-database value.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod tools;
pub mod transport;
pub mod version;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use mcp::DbService;
pub use tools::{SessionState, ToolRouter};
