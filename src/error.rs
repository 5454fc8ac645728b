//! Error types for the MariaDB MCP Server.
//!
//! Every failure a tool call can hit is a [`DbError`]. The dispatch boundary turns each one into
//! an `Error: ...` text result, so the `Display` output of every variant is user-visible and part
//! of the tool contract.

use thiserror::Error;

/// Message returned when a data-touching tool runs before any database is selected.
pub const NO_DATABASE_MESSAGE: &str = "No database selected. Use switch_database tool first.";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("No database selected. Use switch_database tool first.")]
    NoDatabaseSelected,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{message}")]
    Connection { message: String, suggestion: String },

    /// The pool is saturated and the caller may not (or can no longer) wait.
    #[error("{reason}")]
    PoolExhausted { reason: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    /// Engine-reported failure; the message is forwarded verbatim.
    #[error("{message}")]
    Query {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
    },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a pool exhausted error.
    pub fn pool_exhausted(reason: impl Into<String>) -> Self {
        Self::PoolExhausted {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an unknown tool error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Taxonomy name of this error, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoDatabaseSelected => "NoDatabaseSelected",
            Self::InvalidInput { .. } => "ValidationError",
            Self::Connection { .. } | Self::Timeout { .. } => "ConnectionError",
            Self::PoolExhausted { .. } => "PoolExhausted",
            Self::Query { .. } => "QueryError",
            Self::UnknownTool { .. } => "UnknownTool",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::NoDatabaseSelected => Some("Call switch_database first"),
            Self::PoolExhausted { .. } => Some("Retry later or raise POOL_CONNECTION_LIMIT"),
            _ => None,
        }
    }

    /// Check if this error is retryable. Nothing retries automatically; this only informs logs.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::PoolExhausted { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query(db_err.message(), code)
            }
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check DB_HOST, DB_PORT, DB_USER and DB_PASS",
            ),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out while establishing a database connection",
                "Check network connectivity and database server status",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::RowNotFound => DbError::query("No rows returned", None),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
