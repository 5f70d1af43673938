//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Transport-level failure (connection refused, DNS, malformed response).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered with a JSON-RPC error.
    #[error("Node rejected request: {0}")]
    Node(String),

    /// The provider is throttling us.
    #[error("Upstream rate limit: {0}")]
    RateLimited(String),

    /// The provider refused for quota or authorization reasons.
    #[error("Upstream quota or authorization failure: {0}")]
    Quota(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Nonce management error.
    #[error("Nonce error: {0}")]
    Nonce(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Return data could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

const RATE_LIMIT_MARKERS: &[&str] = &["http error 429", "rate limit", "too many requests"];

const QUOTA_MARKERS: &[&str] = &[
    "http error 401",
    "http error 402",
    "http error 403",
    "unauthorized",
    "forbidden",
    "payment required",
    "quota",
    "request count exceeded",
    "invalid project id",
];

impl BlockchainError {
    /// Classify an upstream error message.
    ///
    /// `node_response` is true when the node itself returned a JSON-RPC error
    /// object, as opposed to a transport failure.
    pub fn classify(message: impl Into<String>, node_response: bool) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
            BlockchainError::RateLimited(message)
        } else if QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
            BlockchainError::Quota(message)
        } else if node_response {
            BlockchainError::Node(message)
        } else {
            BlockchainError::Rpc(message)
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BlockchainError::Rpc(_) => "rpc",
            BlockchainError::Node(_) => "node",
            BlockchainError::RateLimited(_) => "rate_limited",
            BlockchainError::Quota(_) => "quota",
            BlockchainError::Timeout(_) => "timeout",
            BlockchainError::Wallet(_) => "wallet",
            BlockchainError::GasPriceTooHigh { .. } => "gas_price_too_high",
            BlockchainError::Nonce(_) => "nonce",
            BlockchainError::ChainMismatch { .. } => "chain_mismatch",
            BlockchainError::Decode(_) => "decode",
        }
    }

    /// Quota or authorization rejection from the provider.
    pub fn is_quota(&self) -> bool {
        matches!(self, BlockchainError::Quota(_))
    }

    /// Upstream conditions that clear up on their own and are handled
    /// locally (fallback values, spacing) rather than escalated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BlockchainError::RateLimited(_)
                | BlockchainError::Quota(_)
                | BlockchainError::Timeout(_)
        )
    }

    /// Caller-facing category for a failed transfer attempt.
    pub fn failure_category(&self) -> &'static str {
        match self {
            BlockchainError::Timeout(_) => return "timeout",
            BlockchainError::RateLimited(_) => return "rate_limited",
            BlockchainError::Quota(_) => return "quota",
            BlockchainError::GasPriceTooHigh { .. } => return "gas_price_too_high",
            BlockchainError::Nonce(_) => return "nonce_error",
            _ => {}
        }

        let lower = self.to_string().to_lowercase();
        if lower.contains("insufficient funds") || lower.contains("exceeds balance") {
            "insufficient_funds"
        } else if lower.contains("gas required exceeds")
            || lower.contains("intrinsic gas too low")
            || lower.contains("out of gas")
        {
            "insufficient_gas"
        } else if lower.contains("nonce") {
            "nonce_error"
        } else if lower.contains("timeout") || lower.contains("timed out") {
            "timeout"
        } else {
            "unknown"
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// The parts of a transaction receipt the relay reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// On-chain status flag; false for reverted transactions.
    pub success: bool,
    pub from: Address,
    pub to: Option<Address>,
}

/// A transaction as known to the node, mined or pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSummary {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    pub input: Bytes,
    /// `None` while the transaction sits in the mempool.
    pub block_number: Option<u64>,
}

/// A decoded ERC-20 `Transfer` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLog {
    pub tx_hash: Option<TxHash>,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub block_number: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BlockchainConfig::default();
        assert_eq!(config.rpc_timeout_secs, 10);
        assert_eq!(config.gas_cache_ttl_secs, 120);
        assert_eq!(config.rate_limit_interval_ms, 500);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = BlockchainError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));
    }

    #[test]
    fn test_classify_rate_limit_and_quota() {
        let err = BlockchainError::classify("HTTP error 429 with body: Too Many Requests", false);
        assert!(matches!(err, BlockchainError::RateLimited(_)));
        assert!(err.is_recoverable());

        let err = BlockchainError::classify("HTTP error 402 with body: payment required", false);
        assert!(err.is_quota());

        let err = BlockchainError::classify("daily request count exceeded", true);
        assert!(err.is_quota());
    }

    #[test]
    fn test_classify_plain_errors() {
        let err = BlockchainError::classify("connection refused", false);
        assert!(matches!(err, BlockchainError::Rpc(_)));
        assert!(!err.is_recoverable());

        let err = BlockchainError::classify("nonce too low", true);
        assert!(matches!(err, BlockchainError::Node(_)));
    }

    #[test]
    fn test_failure_category() {
        let err = BlockchainError::Node("insufficient funds for gas * price + value".into());
        assert_eq!(err.failure_category(), "insufficient_funds");

        let err = BlockchainError::Node("intrinsic gas too low".into());
        assert_eq!(err.failure_category(), "insufficient_gas");

        let err = BlockchainError::Node("nonce too low".into());
        assert_eq!(err.failure_category(), "nonce_error");

        assert_eq!(BlockchainError::Timeout(10).failure_category(), "timeout");
        assert_eq!(BlockchainError::Rpc("boom".into()).failure_category(), "unknown");
    }
}
