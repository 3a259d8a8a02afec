use clap::Parser;
use std::path::PathBuf;

/// Server CLI for gn-server
#[derive(Parser, Debug, Clone)]
#[command(name = "gn-server", version, about = "Game-Nights lobby and game server")]
pub struct ServerCli {
    /// Path to config file
    #[arg(long, default_value = "gn-server.toml")]
    pub config: PathBuf,

    /// Port to bind (overrides config.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Persist CLI overrides back to the config file
    #[arg(long, default_value_t = false)]
    pub persist: bool,

    /// Enable verbose debug logging
    #[arg(long, short, default_value_t = false)]
    pub debug: bool,
}
