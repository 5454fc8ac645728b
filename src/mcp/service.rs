//! MCP service implementation using rmcp.
//!
//! `DbService` implements `ServerHandler` by hand rather than through the `#[tool_router]`
//! macros: every call, including one naming an unknown tool or carrying bad arguments, must come
//! back as a tool result with `isError` set, never as a protocol error.

use crate::db::{ConnectionSource, MySqlSource};
use crate::tools::{ToolRouter, descriptors};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, JsonObject, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};

pub const SERVER_NAME: &str = "mariadb-mcp-server";

pub struct DbService<S: ConnectionSource = MySqlSource> {
    router: ToolRouter<S>,
}

impl<S: ConnectionSource> Clone for DbService<S> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
        }
    }
}

impl<S: ConnectionSource> DbService<S> {
    pub fn new(router: ToolRouter<S>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &ToolRouter<S> {
        &self.router
    }

    /// The advertised tool list.
    pub fn tool_list(&self) -> Vec<Tool> {
        descriptors().to_vec()
    }

    /// Run a tool call and wrap its outcome as an MCP result.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        self.router.dispatch(name, arguments).await.into()
    }
}

impl<S: ConnectionSource> ServerHandler for DbService<S> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_owned(),
                title: Some("MariaDB MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for querying a MariaDB/MySQL server.\n\
                \n\
                ## Workflow\n\
                1. Call `list_databases` to see what is available\n\
                2. Call `switch_database` to select one (unless a default is configured)\n\
                3. Use `list_tables`, `describe_table` and `execute_sql` against it\n\
                \n\
                `get_current_database` reports the selection. Queries run verbatim; results \
                are JSON text. Failures are returned as text starting with `Error: `."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(&request.name, request.arguments).await)
    }
}
