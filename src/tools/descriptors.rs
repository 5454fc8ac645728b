//! Tool names, input types and the descriptors advertised to clients.
//!
//! Input structs double as the argument validator: a call's `arguments` object is deserialized
//! into the tool's input type, and the advertised JSON Schema is derived from the same type.

use crate::error::{DbError, DbResult};
use crate::tools::identifier::RawIdentifier;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

/// The six tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ExecuteSql,
    ListTables,
    DescribeTable,
    ListDatabases,
    SwitchDatabase,
    GetCurrentDatabase,
}

impl ToolName {
    /// Every tool, in advertised order.
    pub const ALL: [ToolName; 6] = [
        ToolName::ExecuteSql,
        ToolName::ListTables,
        ToolName::DescribeTable,
        ToolName::ListDatabases,
        ToolName::SwitchDatabase,
        ToolName::GetCurrentDatabase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ExecuteSql => "execute_sql",
            ToolName::ListTables => "list_tables",
            ToolName::DescribeTable => "describe_table",
            ToolName::ListDatabases => "list_databases",
            ToolName::SwitchDatabase => "switch_database",
            ToolName::GetCurrentDatabase => "get_current_database",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolName::ExecuteSql => "Execute a SQL query on the MariaDB database",
            ToolName::ListTables => "List all tables in the current database",
            ToolName::DescribeTable => "Show the structure of a table",
            ToolName::ListDatabases => "List all available databases",
            ToolName::SwitchDatabase => {
                "Switch to a different database. Must be called before executing queries."
            }
            ToolName::GetCurrentDatabase => "Get the name of the currently selected database",
        }
    }

    /// Whether the tool runs against the selected database.
    pub fn requires_database(self) -> bool {
        matches!(
            self,
            ToolName::ExecuteSql | ToolName::ListTables | ToolName::DescribeTable
        )
    }

    fn input_schema(self) -> Arc<JsonObject> {
        match self {
            ToolName::ExecuteSql => input_schema::<ExecuteSqlInput>(),
            ToolName::DescribeTable => input_schema::<DescribeTableInput>(),
            ToolName::SwitchDatabase => input_schema::<SwitchDatabaseInput>(),
            ToolName::ListTables | ToolName::ListDatabases | ToolName::GetCurrentDatabase => {
                input_schema::<NoArguments>()
            }
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = DbError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| DbError::unknown_tool(name))
    }
}

/// Input for the execute_sql tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteSqlInput {
    /// SQL query to execute (SELECT, INSERT, UPDATE, DELETE, etc.)
    pub query: String,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe
    pub table: String,
}

impl DescribeTableInput {
    pub fn table(self) -> RawIdentifier {
        RawIdentifier::new_unchecked(self.table)
    }
}

/// Input for the switch_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SwitchDatabaseInput {
    /// Name of the database to switch to
    pub database: String,
}

impl SwitchDatabaseInput {
    pub fn database(self) -> RawIdentifier {
        RawIdentifier::new_unchecked(self.database)
    }
}

/// Input for tools that take no arguments. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoArguments {}

/// Deserialize a call's arguments into a tool's input type.
///
/// Absent arguments are treated as an empty object.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Option<JsonObject>) -> DbResult<T> {
    let value = JsonValue::Object(arguments.unwrap_or_default());
    serde_json::from_value(value).map_err(|e| DbError::invalid_input(e.to_string()))
}

/// JSON Schema for `T`, trimmed to what MCP clients expect in `inputSchema`.
fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let mut schema = match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(JsonValue::Object(map)) => map,
        _ => JsonObject::new(),
    };
    schema.remove("$schema");
    schema.remove("title");
    schema.remove("description");
    schema.entry("type").or_insert_with(|| json!("object"));
    schema.entry("properties").or_insert_with(|| json!({}));
    Arc::new(schema)
}

static DESCRIPTORS: LazyLock<Vec<Tool>> = LazyLock::new(|| {
    ToolName::ALL
        .into_iter()
        .map(|tool| Tool::new(tool.as_str(), tool.description(), tool.input_schema()))
        .collect()
});

/// Descriptors for every tool, built once.
pub fn descriptors() -> &'static [Tool] {
    &DESCRIPTORS
}
