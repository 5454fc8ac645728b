//! MariaDB MCP Server - Main entry point.

use mariadb_mcp_server::config::{Config, TransportMode};
use mariadb_mcp_server::db::mysql::connect_options;
use mariadb_mcp_server::db::{ConnectionPool, MySqlSource};
use mariadb_mcp_server::tools::{SessionState, ToolRouter};
use mariadb_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use mariadb_mcp_server::version::BUILD_NAME;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries the protocol.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!(
        transport = %config.transport,
        build = BUILD_NAME,
        "Starting MariaDB MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(config).await {
        error!("Fatal error: {e}");
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let pool_options = config.pool_options()?;
    let source = MySqlSource::connect_lazy(connect_options(&config), &pool_options);
    let pool = Arc::new(ConnectionPool::new(source, pool_options));

    let default_database = config.default_database();
    if let Some(db) = &default_database {
        info!(database = %db, "Default database selected");
    }

    let router = ToolRouter::new(pool, SessionState::new(default_database.clone()))
        .with_strict_identifiers(config.strict_identifiers);

    match config.transport {
        TransportMode::Stdio => StdioTransport::new(router).run().await?,
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                router,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .with_session_scope(config.session_scope, default_database)
            .run()
            .await?
        }
    }

    Ok(())
}
