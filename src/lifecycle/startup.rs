//! Startup orchestration.
//!
//! # Order
//! 1. Connect to the RPC endpoints and check the chain ID
//! 2. Build the relay from the master key
//! 3. Seed the hot wallet's nonce counter (fatal on failure unless the
//!    configured fallback applies)
//! 4. Start the metrics exporter
//! 5. Bind the listener last, so traffic only arrives once ready

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use zeroize::Zeroizing;

use crate::blockchain::wallet::read_master_key;
use crate::blockchain::{BlockchainClient, BlockchainError};
use crate::config::RelayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::relay::{Relay, RelayError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Blockchain setup failed: {0}")]
    Chain(#[from] BlockchainError),

    #[error("Relay setup failed: {0}")]
    Relay(#[from] RelayError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A relay ready to serve, with its listener bound.
pub struct Bootstrap {
    pub relay: Arc<Relay>,
    pub listener: TcpListener,
}

/// Run steps 1 through 5.
pub async fn bootstrap(config: &RelayConfig, master_key: &str) -> Result<Bootstrap, StartupError> {
    let client = BlockchainClient::new(config.blockchain.clone())?;

    match client.verify_chain_id().await {
        Ok(()) => tracing::info!(chain_id = config.blockchain.chain_id, "Chain ID verified"),
        Err(e @ BlockchainError::ChainMismatch { .. }) => return Err(e.into()),
        // Reachability is settled by the nonce initialization below.
        Err(e) => tracing::warn!(error = %e, "Could not verify chain ID"),
    }

    let relay = Arc::new(Relay::new(config, Arc::new(client), master_key)?);
    let nonce = relay.initialize().await?;
    tracing::info!(
        hot_wallet = %relay.hot_wallet_address(),
        next_nonce = nonce,
        "Relay initialized"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok(Bootstrap { relay, listener })
}

/// Start the relay and serve until a stop signal arrives.
pub async fn run(config: RelayConfig) -> Result<(), StartupError> {
    let master_key = Zeroizing::new(read_master_key()?);
    let Bootstrap { relay, listener } = bootstrap(&config, &master_key).await?;
    drop(master_key);

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    HttpServer::new(config, relay).run(listener, shutdown_rx).await?;
    Ok(())
}
