//! Godot MCP bridge.
//!
//! Speaks MCP (JSON-RPC over stdio) to an editor or agent and forwards tool
//! calls to the Godot editor addon over WebSocket. Logs go to stderr;
//! stdout carries replies only.
//!
//!   godot-mcp-bridge --url ws://localhost:6550

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use godot_mcp_bridge::cli::Cli;
use godot_mcp_bridge::Bridge;
use godot_mcp_client::{ConnectionManager, WsConnector};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = cli.resolve_config().context("loading configuration")?;
    tracing::info!(
        url = %config.url,
        reconnect_delay_ms = config.reconnect_delay_ms,
        tools = config.tools().len(),
        "starting {} {}",
        config.server_name,
        config.server_version
    );

    let upstream = ConnectionManager::new(config.url.clone(), Arc::new(WsConnector))
        .with_reconnect_delay(config.reconnect_delay())
        .with_server_version(config.server_version.clone());
    let bridge = Bridge::new(&config, upstream);

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    bridge.run(stdin, stdout, shutdown_signal()).await?;

    tracing::info!("bridge stopped");
    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
            .add_directive("godot_mcp_bridge=info".parse()?)
            .add_directive("godot_mcp_client=info".parse()?)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
