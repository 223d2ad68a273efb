// CLI module for offline-gateway
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;

/// offline-gateway - Cache-first offline gateway for the Quran reader
#[derive(Parser, Debug)]
#[command(name = "offline-gateway", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ~/.offline-gateway/config.toml)
    #[arg(short, long, env = "OFFLINE_GATEWAY_CONFIG")]
    pub config: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
