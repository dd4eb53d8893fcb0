// Monarch Money MCP server binary

use anyhow::Result;
use clap::Parser;
use monarch_mcp::bootstrap::{bootstrap, TerminalPrompt};
use monarch_mcp::config::{Args, Settings};
use monarch_mcp::server::McpServer;
use monarch_mcp::tools::monarch_registry;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("Monarch Money MCP server starting...");

    let settings = match Settings::from_args(args) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    let client = match bootstrap(&settings, &TerminalPrompt).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Authentication failed: {:#}", e);
            std::process::exit(1);
        }
    };

    let registry = monarch_registry(client);
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    server.start().await?;

    Ok(())
}

fn init_tracing(json: bool) {
    // stdout carries protocol traffic only
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
