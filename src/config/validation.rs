//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! rules. Every problem is reported, not just the first one.

use alloy::primitives::Address;

use crate::config::schema::{NonceFallback, RelayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let chain = &config.blockchain;
    if chain.rpc_url.trim().is_empty() {
        errors.push(ValidationError::new("blockchain.rpc_url", "must not be empty"));
    } else if let Err(e) = chain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new("blockchain.rpc_url", e.to_string()));
    }
    for url in &chain.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "blockchain.failover_urls",
                format!("'{}' is not a valid URL", url),
            ));
        }
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }
    if !(chain.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "blockchain.gas_price_multiplier",
            "must be at least 1.0; underpriced transactions get stuck",
        ));
    }
    if chain.gas_cache_ttl_secs == 0 {
        errors.push(ValidationError::new(
            "blockchain.gas_cache_ttl_secs",
            "must be greater than 0",
        ));
    }
    if chain.max_gas_price_gwei == 0 {
        errors.push(ValidationError::new(
            "blockchain.max_gas_price_gwei",
            "must be greater than 0",
        ));
    }
    if chain.nonce_fallback == NonceFallback::Zero && chain.is_mainnet() {
        errors.push(ValidationError::new(
            "blockchain.nonce_fallback",
            "\"zero\" is only allowed on non-production chains",
        ));
    }

    if config.token.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "token.contract_address",
            format!("'{}' is not an address", config.token.contract_address),
        ));
    }
    if config.token.transfer_gas_limit < 21_000 {
        errors.push(ValidationError::new(
            "token.transfer_gas_limit",
            "must be at least 21000",
        ));
    }
    if config.token.lookback_blocks == 0 {
        errors.push(ValidationError::new("token.lookback_blocks", "must be greater than 0"));
    }
    if config.token.zero_balance_max_attempts == 0 {
        errors.push(ValidationError::new(
            "token.zero_balance_max_attempts",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = RelayConfig::default();
        config.blockchain.rpc_url = String::new();
        config.blockchain.gas_price_multiplier = 0.9;
        config.token.contract_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "blockchain.rpc_url",
                "blockchain.gas_price_multiplier",
                "token.contract_address"
            ]
        );
    }

    #[test]
    fn test_zero_nonce_fallback_rejected_on_mainnet() {
        let mut config = RelayConfig::default();
        config.blockchain.nonce_fallback = NonceFallback::Zero;
        assert!(validate_config(&config).is_err());

        config.blockchain.chain_id = 11155111;
        assert!(validate_config(&config).is_ok());
    }
}
