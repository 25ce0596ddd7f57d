//! TickTick MCP server binary (stdio transport).

use miette::{IntoDiagnostic, Result};
use rmcp::ServiceExt;
use ticktick::mcp::TickTickMcpServer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs go to stderr; stdout carries the MCP protocol.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ticktick=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // rustls ships without a default provider under this feature set
    let _ = rustls::crypto::ring::default_provider().install_default();
    init_tracing();

    tracing::info!("Starting TickTick MCP server");

    let server = TickTickMcpServer::new()?;
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .into_diagnostic()?;

    tracing::info!("Server running on stdio, waiting for requests");
    service.waiting().await.into_diagnostic()?;

    tracing::info!("Server shutting down");
    Ok(())
}
