//! Tool dispatch.
//!
//! [`ToolRouter::dispatch`] is the single boundary between callers and the database: it
//! resolves the tool, checks its precondition, borrows a pooled connection, pins the selected
//! database on it, runs the operation and folds every outcome (including panics) into a
//! [`ToolResponse`].

use crate::db::{ConnectionPool, ConnectionSource, SqlSession};
use crate::error::{DbError, DbResult};
use crate::tools::descriptors::{
    DescribeTableInput, ExecuteSqlInput, NoArguments, SwitchDatabaseInput, ToolName,
    parse_arguments,
};
use crate::tools::identifier::RawIdentifier;
use crate::tools::response::{ToolResponse, current_database_message, switched_message};
use crate::tools::session::SessionState;
use futures_util::FutureExt;
use rmcp::model::JsonObject;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ToolRouter<S: ConnectionSource> {
    pool: Arc<ConnectionPool<S>>,
    session: SessionState,
    strict_identifiers: bool,
}

impl<S: ConnectionSource> Clone for ToolRouter<S> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            session: self.session.clone(),
            strict_identifiers: self.strict_identifiers,
        }
    }
}

impl<S: ConnectionSource> ToolRouter<S> {
    pub fn new(pool: Arc<ConnectionPool<S>>, session: SessionState) -> Self {
        Self {
            pool,
            session,
            strict_identifiers: false,
        }
    }

    /// Reject table and database names that are not plain identifiers.
    pub fn with_strict_identifiers(mut self, strict: bool) -> Self {
        self.strict_identifiers = strict;
        self
    }

    /// A router over the same pool with its own selected-database value.
    pub fn with_session(&self, session: SessionState) -> Self {
        Self {
            session,
            ..self.clone()
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<S>> {
        &self.pool
    }

    /// Run one tool call. Never fails: errors become `Error: ...` responses.
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonObject>) -> ToolResponse {
        debug!(tool = %name, "Dispatching tool call");

        let outcome = AssertUnwindSafe(self.route(name, arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DbError::internal(panic_message(panic.as_ref()))));

        match outcome {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    tool = %name,
                    kind = err.kind(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "Tool call failed"
                );
                ToolResponse::from(err)
            }
        }
    }

    async fn route(&self, name: &str, arguments: Option<JsonObject>) -> DbResult<ToolResponse> {
        let tool: ToolName = name.parse()?;

        // One snapshot per call: a concurrent switch is either fully seen or not at all
        let database = if tool.requires_database() {
            Some(
                self.session
                    .current()
                    .await
                    .ok_or(DbError::NoDatabaseSelected)?,
            )
        } else {
            None
        };

        match (tool, database) {
            (ToolName::ExecuteSql, Some(db)) => {
                let input: ExecuteSqlInput = parse_arguments(arguments)?;
                let rows = self.run_in(&db, &input.query).await?;
                Ok(ToolResponse::json(&rows))
            }
            (ToolName::ListTables, Some(db)) => {
                let _: NoArguments = parse_arguments(arguments)?;
                let rows = self.run_in(&db, "SHOW TABLES").await?;
                Ok(ToolResponse::json(&rows))
            }
            (ToolName::DescribeTable, Some(db)) => {
                let input: DescribeTableInput = parse_arguments(arguments)?;
                let table = input.table().checked(self.strict_identifiers)?;
                let rows = self.run_in(&db, &format!("DESCRIBE {table}")).await?;
                Ok(ToolResponse::json(&rows))
            }
            (ToolName::ListDatabases, _) => {
                let _: NoArguments = parse_arguments(arguments)?;
                let mut conn = self.pool.acquire().await?;
                let rows = conn.run("SHOW DATABASES").await?;
                Ok(ToolResponse::json(&rows))
            }
            (ToolName::SwitchDatabase, _) => {
                let input: SwitchDatabaseInput = parse_arguments(arguments)?;
                let database = input.database().checked(self.strict_identifiers)?;
                self.switch_database(database).await
            }
            (ToolName::GetCurrentDatabase, _) => {
                let _: NoArguments = parse_arguments(arguments)?;
                let current = self.session.current().await;
                Ok(ToolResponse::Success(current_database_message(
                    current.as_deref(),
                )))
            }
            (tool, None) => Err(DbError::internal(format!(
                "{tool} dispatched without a selected database"
            ))),
        }
    }

    /// Borrow a connection, pin `database` on it and run `sql`.
    async fn run_in(&self, database: &str, sql: &str) -> DbResult<JsonValue> {
        let mut conn = self.pool.acquire().await?;
        conn.run(&format!("USE {database}")).await?;
        conn.run(sql).await
    }

    /// Probe `database` on a pooled connection, then commit it as the selection.
    ///
    /// A failed probe leaves the selection untouched.
    async fn switch_database(&self, database: RawIdentifier) -> DbResult<ToolResponse> {
        {
            let mut conn = self.pool.acquire().await?;
            conn.run(&format!("USE {database}")).await?;
        }

        let database = database.into_inner();
        self.session.select(database.as_str()).await;
        info!(database = %database, "Switched database");
        Ok(ToolResponse::Success(switched_message(&database)))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}
