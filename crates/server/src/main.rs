//! freshgate server entry point.
//!
//! Boots the gateway (install, then activate) and serves the MCP tools on
//! stdio. When `proxy_listen` is configured, the intercepting HTTP proxy runs
//! alongside on the same gateway.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use freshgate_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod gateway;
mod handler;
mod proxy;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        asset_version = %config.asset_version,
        db_path = %config.db_path.display(),
        "starting freshgate"
    );

    let gateway = Arc::new(gateway::Gateway::boot(config).await?);

    if let Some(addr) = gateway.config().proxy_listen.clone() {
        let proxied = Arc::clone(&gateway);
        tokio::spawn(async move {
            if let Err(e) = proxy::serve(&addr, proxied).await {
                tracing::error!(addr = %addr, error = %e, "proxy stopped");
            }
        });
    }

    let handler = handler::FreshgateServer::new(Arc::clone(&gateway));
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    gateway.retire().await;
    Ok(())
}
