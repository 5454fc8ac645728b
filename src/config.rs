//! Configuration handling for the MariaDB MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.
//! Database and pool options keep the environment names of existing deployments
//! (`DB_HOST`, `POOL_CONNECTION_LIMIT`, ...); server options use the `MCP_` prefix.

use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "claude_mcp";

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// Pool configuration defaults
pub const DEFAULT_CONNECTION_LIMIT: u32 = 10;
pub const DEFAULT_QUEUE_LIMIT: usize = 0;

/// Connection pool admission policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum simultaneous live connections
    pub connection_limit: u32,
    /// Maximum callers allowed to wait while the pool is saturated (0 = unbounded)
    pub queue_limit: usize,
    /// If false, acquiring from a saturated pool fails immediately
    pub wait_for_connections: bool,
    /// Upper bound on the wait for a free connection (None = wait indefinitely)
    pub acquire_timeout: Option<Duration>,
    /// Upper bound on opening a new network connection
    pub connect_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            wait_for_connections: true,
            acquire_timeout: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl PoolOptions {
    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.connection_limit == 0 {
            return Err("connection_limit must be greater than 0".to_string());
        }
        if self.acquire_timeout == Some(Duration::ZERO) {
            return Err(
                "acquire_timeout must be greater than 0 (omit it to wait indefinitely)"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Scope of the selected-database value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SessionScope {
    /// One value shared by every caller of the process
    #[default]
    Global,
    /// A fresh value for each MCP session (HTTP transport)
    PerSession,
}

impl std::fmt::Display for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::PerSession => write!(f, "per-session"),
        }
    }
}

/// Waiting stays enabled for anything except a literal "false".
fn parse_wait_flag(value: &str) -> Result<bool, String> {
    Ok(!value.trim().eq_ignore_ascii_case("false"))
}

/// Configuration for the MariaDB MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mariadb-mcp-server",
    about = "MCP server for MariaDB/MySQL - lets AI assistants query a database",
    version,
    long_version = crate::version::LONG_VERSION,
    author
)]
pub struct Config {
    /// Database server host
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// Database server port
    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "DB_PORT")]
    pub db_port: u16,

    /// Database user
    #[arg(long, default_value = DEFAULT_DB_USER, env = "DB_USER")]
    pub db_user: String,

    /// Database password
    #[arg(long, default_value = "", env = "DB_PASS", hide_env_values = true)]
    pub db_pass: String,

    /// Database selected at startup (optional; switch_database changes it)
    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Maximum simultaneous live connections
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECTION_LIMIT,
        env = "POOL_CONNECTION_LIMIT"
    )]
    pub pool_connection_limit: u32,

    /// Maximum callers waiting for a connection (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_QUEUE_LIMIT, env = "POOL_QUEUE_LIMIT")]
    pub pool_queue_limit: usize,

    /// Wait for a free connection when the pool is saturated ("false" fails immediately)
    #[arg(
        long,
        default_value = "true",
        env = "POOL_WAIT_FOR_CONNECTIONS",
        action = clap::ArgAction::Set,
        value_parser = parse_wait_flag
    )]
    pub pool_wait_for_connections: bool,

    /// Seconds to wait for a free connection before failing (default: wait indefinitely)
    #[arg(long, env = "POOL_ACQUIRE_TIMEOUT")]
    pub pool_acquire_timeout: Option<u64>,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "MCP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Scope of the selected database (global or per-session)
    #[arg(
        long,
        value_enum,
        default_value = "global",
        env = "MCP_SESSION_SCOPE"
    )]
    pub session_scope: SessionScope,

    /// Reject table/database names that are not plain identifiers
    #[arg(long, env = "MCP_STRICT_IDENTIFIERS")]
    pub strict_identifiers: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_user: DEFAULT_DB_USER.to_string(),
            db_pass: String::new(),
            db_name: None,
            pool_connection_limit: DEFAULT_CONNECTION_LIMIT,
            pool_queue_limit: DEFAULT_QUEUE_LIMIT,
            pool_wait_for_connections: true,
            pool_acquire_timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            session_scope: SessionScope::Global,
            strict_identifiers: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// The database selected at startup. An empty `DB_NAME` means none.
    pub fn default_database(&self) -> Option<String> {
        self.db_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
    }

    /// Build and validate the pool admission policy.
    pub fn pool_options(&self) -> Result<PoolOptions, String> {
        let options = PoolOptions {
            connection_limit: self.pool_connection_limit,
            queue_limit: self.pool_queue_limit,
            wait_for_connections: self.pool_wait_for_connections,
            acquire_timeout: self.pool_acquire_timeout.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_duration(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["mariadb-mcp-server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.db_host, DEFAULT_DB_HOST);
        assert_eq!(config.db_port, 3306);
        assert_eq!(config.db_user, "claude_mcp");
        assert_eq!(config.session_scope, SessionScope::Global);
        assert_eq!(config.default_database(), None);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_default_database_ignores_empty() {
        let config = Config {
            db_name: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.default_database(), None);

        let config = Config {
            db_name: Some("shop".to_string()),
            ..Config::default()
        };
        assert_eq!(config.default_database().as_deref(), Some("shop"));
    }

    #[test]
    fn test_wait_flag_only_false_disables() {
        assert_eq!(parse_wait_flag("false"), Ok(false));
        assert_eq!(parse_wait_flag("FALSE"), Ok(false));
        assert_eq!(parse_wait_flag("true"), Ok(true));
        assert_eq!(parse_wait_flag("0"), Ok(true));
        assert_eq!(parse_wait_flag(""), Ok(true));
    }

    #[test]
    fn test_parse_pool_flags() {
        let config = parse(&[
            "--pool-connection-limit",
            "3",
            "--pool-queue-limit",
            "5",
            "--pool-wait-for-connections",
            "false",
            "--pool-acquire-timeout",
            "7",
        ]);
        let options = config.pool_options().unwrap();
        assert_eq!(options.connection_limit, 3);
        assert_eq!(options.queue_limit, 5);
        assert!(!options.wait_for_connections);
        assert_eq!(options.acquire_timeout, Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_parse_session_scope() {
        let config = parse(&["--session-scope", "per-session"]);
        assert_eq!(config.session_scope, SessionScope::PerSession);
    }

    #[test]
    fn test_zero_connection_limit_rejected() {
        let config = Config {
            pool_connection_limit: 0,
            ..Config::default()
        };
        assert!(config.pool_options().is_err());
    }

    #[test]
    fn test_zero_acquire_timeout_rejected() {
        let options = PoolOptions {
            acquire_timeout: Some(Duration::ZERO),
            ..PoolOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
