//! Main entry point for the Game-Nights server.

use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use native_gn::cli::ServerCli;
use native_gn::config::Config;
use native_gn::server::{run_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ServerCli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path: PathBuf = cli.config.clone();
    let mut cfg = Config::load_or_create(&config_path)
        .with_context(|| format!("loading or creating config '{}'", config_path.display()))?;

    // CLI overrides apply in-memory; --persist writes them back
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if cli.persist {
        cfg.save(&config_path)
            .with_context(|| format!("saving updated config '{}'", config_path.display()))?;
    }

    tracing::info!(config = %config_path.display(), port = cfg.port);

    let port = find_available_port(cfg.port)
        .map_err(|e| anyhow::anyhow!("Could not find an available port: {}", e))?;
    if port != cfg.port {
        tracing::warn!(port, "configured port was not available, using alternative");
    }
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let state = AppState::new(cfg, Some(config_path));
    run_server(addr, state).await?;
    Ok(())
}

/// Find the first available port starting from the given port number.
fn find_available_port(start_port: u16) -> anyhow::Result<u16> {
    for port in start_port..start_port.saturating_add(100) {
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(_) => return Ok(port),
            Err(_) => continue,
        }
    }
    Err(anyhow::anyhow!(
        "No available ports found in range {}..{}",
        start_port,
        start_port.saturating_add(100)
    ))
}
