//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the JSON-RPC endpoint.
pub const RPC_URL_ENV_VAR: &str = "RELAY_RPC_URL";
/// Overrides the chain ID.
pub const CHAIN_ID_ENV_VAR: &str = "RELAY_CHAIN_ID";
/// Overrides the token contract address.
pub const TOKEN_CONTRACT_ENV_VAR: &str = "RELAY_TOKEN_CONTRACT";
/// Overrides the listening port (host part of the bind address is kept).
pub const PORT_ENV_VAR: &str = "RELAY_PORT";
/// Overrides the log level.
pub const LOG_LEVEL_ENV_VAR: &str = "RELAY_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using the given lookup function.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(RPC_URL_ENV_VAR) {
        config.blockchain.rpc_url = url;
    }

    if let Some(chain_id) = lookup(CHAIN_ID_ENV_VAR) {
        config.blockchain.chain_id = chain_id.trim().parse().map_err(|e| ConfigError::Env {
            var: CHAIN_ID_ENV_VAR,
            message: format!("{}", e),
        })?;
    }

    if let Some(token) = lookup(TOKEN_CONTRACT_ENV_VAR) {
        config.token.contract_address = token.trim().to_string();
    }

    if let Some(port) = lookup(PORT_ENV_VAR) {
        let port: u16 = port.trim().parse().map_err(|e| ConfigError::Env {
            var: PORT_ENV_VAR,
            message: format!("{}", e),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(level) = lookup(LOG_LEVEL_ENV_VAR) {
        config.observability.log_level = level;
    }

    Ok(())
}
