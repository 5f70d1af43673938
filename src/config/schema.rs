//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.
//! The master private key is deliberately absent: it is read from the
//! environment only (see `blockchain::wallet::MASTER_KEY_ENV_VAR`).

use serde::{Deserialize, Serialize};

/// Root configuration for the token relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Chain access settings.
    pub blockchain: BlockchainConfig,

    /// Token contract and transfer settings.
    pub token: TokenConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3100").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3100".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// What to do when the startup nonce query is rejected for quota or
/// authorization reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NonceFallback {
    /// Refuse to start.
    #[default]
    Abort,
    /// Start with nonce 0. Rejected by validation on mainnet.
    Zero,
}

/// Chain access configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (1 for Ethereum mainnet, 11155111 for Sepolia, 31337 for Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Gas price multiplier (1.0 = as reported, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// How long a fetched gas price is trusted, in seconds.
    pub gas_cache_ttl_secs: u64,

    /// Minimum spacing between rate-limited upstream calls, in milliseconds.
    pub rate_limit_interval_ms: u64,

    /// Startup policy when the pending nonce cannot be read.
    pub nonce_fallback: NonceFallback,
}

impl BlockchainConfig {
    /// Whether the configured chain is Ethereum mainnet.
    pub fn is_mainnet(&self) -> bool {
        self.chain_id == 1
    }

    /// Host part of the RPC URL. Provider URLs often carry an API key in
    /// the path, so this is the only part that goes into logs.
    pub fn rpc_host(&self) -> String {
        url::Url::parse(&self.rpc_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| "<invalid>".to_string())
    }
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            gas_cache_ttl_secs: 120,
            rate_limit_interval_ms: 500,
            nonce_fallback: NonceFallback::Abort,
        }
    }
}

/// Token contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Address of the ERC-20 token contract.
    pub contract_address: String,

    /// Pre-measured gas limit for a hot-wallet `transfer` call.
    pub transfer_gas_limit: u64,

    /// Number of blocks scanned by the recent-transfers query.
    pub lookback_blocks: u64,

    /// Attempt cap for the zero-balance address search.
    pub zero_balance_max_attempts: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            // USDT on Ethereum mainnet
            contract_address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
            transfer_gas_limit: 100_000,
            lookback_blocks: 100,
            zero_balance_max_attempts: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [blockchain]
            rpc_url = "https://sepolia.example.org/v3/abc"
            chain_id = 11155111
            "#,
        )
        .unwrap();

        assert_eq!(config.blockchain.chain_id, 11155111);
        assert_eq!(config.blockchain.gas_cache_ttl_secs, 120);
        assert_eq!(config.blockchain.nonce_fallback, NonceFallback::Abort);
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.token.zero_balance_max_attempts, 100);
        assert!(!config.blockchain.is_mainnet());
    }

    #[test]
    fn test_nonce_fallback_parses_lowercase() {
        let config: RelayConfig = toml::from_str(
            r#"
            [blockchain]
            nonce_fallback = "zero"
            "#,
        )
        .unwrap();
        assert_eq!(config.blockchain.nonce_fallback, NonceFallback::Zero);
    }

    #[test]
    fn test_rpc_host_drops_path_and_key() {
        let mut config = BlockchainConfig {
            rpc_url: "https://sepolia.infura.io/v3/abc123".to_string(),
            ..BlockchainConfig::default()
        };
        assert_eq!(config.rpc_host(), "sepolia.infura.io");

        config.rpc_url = "not a url".to_string();
        assert_eq!(config.rpc_host(), "<invalid>");
    }
}
