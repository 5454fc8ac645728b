//! HTTP transport with Streamable HTTP support for the MCP server.
//!
//! Every MCP session gets its own `DbService`. With the global session scope they all share one
//! selected-database value; with the per-session scope each starts from the configured default
//! and switches independently.

use crate::config::SessionScope;
use crate::db::ConnectionSource;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::tools::{SessionState, ToolRouter};
use crate::transport::{Transport, wait_for_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport<S: ConnectionSource> {
    router: ToolRouter<S>,
    session_scope: SessionScope,
    /// Starting selection for per-session state
    default_database: Option<String>,
    host: String,
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl<S: ConnectionSource> HttpTransport<S> {
    pub fn new(
        router: ToolRouter<S>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            router,
            session_scope: SessionScope::Global,
            default_database: None,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    /// Give each MCP session its own selection, starting at `default_database`.
    pub fn with_session_scope(
        mut self,
        scope: SessionScope,
        default_database: Option<String>,
    ) -> Self {
        self.session_scope = scope;
        self.default_database = default_database;
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The service handed to a newly opened MCP session.
    pub fn session_service(&self) -> DbService<S> {
        let router = match self.session_scope {
            SessionScope::Global => self.router.clone(),
            SessionScope::PerSession => self
                .router
                .with_session(SessionState::new(self.default_database.clone())),
        };
        DbService::new(router)
    }
}

impl<S: ConnectionSource> Transport for HttpTransport<S> {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();

        let factory = HttpTransport {
            router: self.router.clone(),
            session_scope: self.session_scope,
            default_database: self.default_database.clone(),
            host: self.host.clone(),
            port: self.port,
            endpoint: self.endpoint.clone(),
        };
        let service = StreamableHttpService::new(
            move || Ok(factory.session_service()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service doesn't support the root path
        let app = if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        };

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::connection(
                format!("Failed to bind to {bind_addr}: {e}"),
                "Check that the port is available",
            )
        })?;

        info!(
            endpoint = %self.endpoint,
            session_scope = %self.session_scope,
            "MariaDB MCP server running on http://{}", bind_addr
        );

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_signal = {
            let notify = Arc::clone(&shutdown_notify);
            async move {
                wait_for_signal().await;
                notify.notify_one();
            }
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // SSE streams can keep the server alive indefinitely after shutdown starts
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(DbError::internal(format!("HTTP server error: {e}")));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        info!("Closing database connections");
        self.router.pool().close().await;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PoolOptions};
    use crate::db::mysql::connect_options;
    use crate::db::{ConnectionPool, MySqlSource};

    fn transport(endpoint: &str) -> HttpTransport<MySqlSource> {
        let options = PoolOptions::default();
        let source = MySqlSource::connect_lazy(connect_options(&Config::default()), &options);
        let pool = Arc::new(ConnectionPool::new(source, options));
        let router = ToolRouter::new(pool, SessionState::new(Some("shop".into())));
        HttpTransport::new(router, "127.0.0.1", 8080, endpoint)
    }

    #[tokio::test]
    async fn test_http_transport_creation() {
        let transport = transport("/mcp");
        assert_eq!(transport.name(), "http");
        assert_eq!(transport.bind_addr(), "127.0.0.1:8080");
        assert_eq!(transport.endpoint(), "/mcp");
    }

    #[tokio::test]
    async fn test_global_scope_shares_selection() {
        let transport = transport("/");
        let a = transport.session_service();
        let b = transport.session_service();
        assert!(a.router().session().shares_state_with(b.router().session()));
    }

    #[tokio::test]
    async fn test_per_session_scope_isolates_selection() {
        let transport = transport("/mcp")
            .with_session_scope(SessionScope::PerSession, Some("analytics".into()));
        let a = transport.session_service();
        let b = transport.session_service();
        assert!(!a.router().session().shares_state_with(b.router().session()));

        a.router().session().select("billing").await;
        assert_eq!(a.router().session().current().await.as_deref(), Some("billing"));
        assert_eq!(b.router().session().current().await.as_deref(), Some("analytics"));
    }
}
