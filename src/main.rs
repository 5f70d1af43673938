//! Token relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                     TOKEN RELAY                      │
//!                  │                                                      │
//!   HTTP request   │  ┌────────┐    ┌──────────┐    ┌──────────────────┐  │
//!   ───────────────┼─▶│  http  │───▶│ handlers │───▶│      relay       │  │
//!                  │  │ server │    └──────────┘    │ transfer/status/ │  │
//!                  │  └────────┘                    │ deposits/account │  │
//!                  │                                └───┬─────────┬────┘  │
//!                  │                                    │         │       │
//!                  │                              ┌─────▼──┐ ┌────▼─────┐ │
//!                  │                              │  keys  │ │blockchain│─┼──▶ JSON-RPC
//!                  │                              │ (HD)   │ │nonce/gas │ │    provider
//!                  │                              └────────┘ └──────────┘ │
//!                  │                                                      │
//!                  │  config · observability · resilience · lifecycle     │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use token_relay::config::loader::load_config;
use token_relay::lifecycle::startup;
use token_relay::observability::logging;

#[derive(Parser)]
#[command(name = "token-relay")]
#[command(about = "Custodial ERC-20 payment relay", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "token-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        chain_id = config.blockchain.chain_id,
        rpc_host = %config.blockchain.rpc_host(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Relay stopped with an error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
