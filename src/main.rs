//! sniproxy - SNI-routing TLS passthrough relay.
//!
//! Reads a YAML config describing a listen address and hostname rules,
//! then relays TLS connections to their advertised hostname on port
//! 443 without decrypting anything.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use sniproxy::config::Config;
use sniproxy::{logging, server};

/// Route TLS connections by SNI hostname without terminating TLS.
#[derive(Debug, Parser)]
#[command(name = "sniproxy", version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short = 'c', long = "config", default_value = "config.yaml")]
    config: PathBuf,

    /// Append log lines to this file in addition to the console.
    #[arg(short = 'l', long = "log-file")]
    log_file: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug, cli.log_file.as_deref())?;

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    config.log_startup(cli.debug);
    server::serve(config).await
}
