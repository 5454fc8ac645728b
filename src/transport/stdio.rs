//! Stdio transport for the MCP server.
//!
//! JSON-RPC messages arrive on stdin and responses leave on stdout, so nothing else may write
//! to stdout while this transport runs.

use crate::db::ConnectionSource;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::tools::ToolRouter;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

pub struct StdioTransport<S: ConnectionSource> {
    router: ToolRouter<S>,
}

impl<S: ConnectionSource> StdioTransport<S> {
    pub fn new(router: ToolRouter<S>) -> Self {
        Self { router }
    }
}

impl<S: ConnectionSource> Transport for StdioTransport<S> {
    async fn run(&self) -> DbResult<()> {
        let service = DbService::new(self.router.clone());
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {e}")))?;

        info!("MariaDB MCP server running on stdio");

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!("Stdio transport error: {e}")));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        info!("Closing database connections");
        self.router.pool().close().await;

        if shutdown_requested {
            // stdin reads block and cannot be interrupted by select!
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
