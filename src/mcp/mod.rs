//! MCP server integration.
//!
//! Bridges the rmcp protocol handler to the tool router.

pub mod service;

pub use service::DbService;
