//! Uniform tool results.
//!
//! Every call produces exactly one [`ToolResponse`]: a text payload, or the same shape flagged as
//! an error. Error text always starts with [`ERROR_PREFIX`].

use crate::error::{DbError, NO_DATABASE_MESSAGE};
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

pub const ERROR_PREFIX: &str = "Error: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResponse {
    Success(String),
    Failure(String),
}

impl ToolResponse {
    pub fn text(&self) -> &str {
        match self {
            ToolResponse::Success(text) | ToolResponse::Failure(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Failure(_))
    }

    /// Render a payload as JSON with two-space indentation.
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> Self {
        match format_json(payload) {
            Ok(text) => ToolResponse::Success(text),
            Err(e) => ToolResponse::from(DbError::internal(e.to_string())),
        }
    }
}

impl From<DbError> for ToolResponse {
    fn from(err: DbError) -> Self {
        ToolResponse::Failure(format!("{ERROR_PREFIX}{err}"))
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        match response {
            ToolResponse::Success(text) => CallToolResult::success(vec![Content::text(text)]),
            ToolResponse::Failure(text) => CallToolResult::error(vec![Content::text(text)]),
        }
    }
}

pub fn format_json<T: Serialize + ?Sized>(payload: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(payload)
}

pub fn switched_message(database: &str) -> String {
    format!("Successfully switched to database: {database}")
}

pub fn current_database_message(database: Option<&str>) -> String {
    match database {
        Some(db) => format!("Current database: {db}"),
        None => NO_DATABASE_MESSAGE.to_string(),
    }
}
