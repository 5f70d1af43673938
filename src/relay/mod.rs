//! The payment relay service.
//!
//! # Data Flow
//! ```text
//! deposits.rs (KeyDerivation: deposit address, zero-balance search)
//!     → funds arrive on-chain
//!     → transfer.rs (send from hot wallet / sweep deposit → hot wallet)
//!         uses NonceSequencer + GasPriceCache, spaced by the rate limiter
//!     → status.rs (poll a transaction's disposition)
//! account.rs: balances, recent incoming transfers, health
//! ```

pub mod account;
pub mod deposits;
pub mod error;
pub mod progress;
pub mod status;
pub mod transfer;
pub mod types;

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{ChainAccess, GasPriceCache, NonceSequencer, Wallet};
use crate::config::{NonceFallback, RelayConfig};
use crate::keys::DepositKeys;
use crate::resilience::UpstreamRateLimiter;

pub use error::RelayError;
pub use progress::{Committed, TransferProgress};
pub use status::{StatusDetail, StatusReport, TxStatus};

/// Relay limits and chain parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub chain_id: u64,
    pub token: Address,
    pub transfer_gas_limit: u64,
    pub max_gas_price_wei: u128,
    pub lookback_blocks: u64,
    pub zero_balance_max_attempts: u32,
    pub nonce_fallback: NonceFallback,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let token = types::parse_address(&config.token.contract_address)?;
        Ok(Self {
            chain_id: config.blockchain.chain_id,
            token,
            transfer_gas_limit: config.token.transfer_gas_limit,
            max_gas_price_wei: u128::from(config.blockchain.max_gas_price_gwei) * 1_000_000_000,
            lookback_blocks: config.token.lookback_blocks,
            zero_balance_max_attempts: config.token.zero_balance_max_attempts,
            nonce_fallback: config.blockchain.nonce_fallback,
        })
    }
}

/// Everything the HTTP facade calls into.
pub struct Relay {
    settings: RelaySettings,
    chain: Arc<dyn ChainAccess>,
    hot_wallet: Wallet,
    keys: DepositKeys,
    nonces: NonceSequencer,
    gas: GasPriceCache,
    limiter: UpstreamRateLimiter,
}

impl Relay {
    /// Build the relay around a chain connection and the master key.
    ///
    /// The nonce counter starts uninitialized; call
    /// [`initialize`](Self::initialize) before serving transfers.
    pub fn new(
        config: &RelayConfig,
        chain: Arc<dyn ChainAccess>,
        master_key: &str,
    ) -> Result<Self, RelayError> {
        let settings = RelaySettings::from_config(config)?;
        let hot_wallet = Wallet::from_private_key(master_key, settings.chain_id)?;
        let keys = DepositKeys::from_master_key(master_key)?;

        let gas = GasPriceCache::new(
            Duration::from_secs(config.blockchain.gas_cache_ttl_secs),
            config.blockchain.gas_price_multiplier,
            settings.chain_id,
        );
        let limiter = UpstreamRateLimiter::new(Duration::from_millis(
            config.blockchain.rate_limit_interval_ms,
        ));

        tracing::info!(
            hot_wallet = %hot_wallet.address(),
            token = %settings.token,
            chain_id = settings.chain_id,
            "Relay created"
        );

        Ok(Self {
            settings,
            chain,
            hot_wallet,
            keys,
            nonces: NonceSequencer::new(),
            gas,
            limiter,
        })
    }

    /// Seed the hot wallet's nonce counter from the chain. Returns the first
    /// nonce that will be issued.
    pub async fn initialize(&self) -> Result<u64, RelayError> {
        let nonce = self
            .nonces
            .initialize(
                self.chain.as_ref(),
                self.hot_wallet.address(),
                self.settings.nonce_fallback,
            )
            .await?;
        Ok(nonce)
    }

    pub fn hot_wallet_address(&self) -> Address {
        self.hot_wallet.address()
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.nonces.is_initialized()
    }

    pub fn keys(&self) -> &DepositKeys {
        &self.keys
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("settings", &self.settings)
            .field("hot_wallet", &self.hot_wallet.address())
            .field("next_nonce", &self.nonces.peek())
            .finish()
    }
}
