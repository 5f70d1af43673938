//! Request and response shapes, and input parsing.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::keys::{self, KeyError};
use crate::relay::error::RelayError;

/// A JSON value that callers send either as a number or a decimal string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl From<u64> for NumberOrString {
    fn from(n: u64) -> Self {
        NumberOrString::Number(n.into())
    }
}

impl From<&str> for NumberOrString {
    fn from(s: &str) -> Self {
        NumberOrString::Text(s.to_string())
    }
}

impl std::fmt::Display for NumberOrString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberOrString::Number(n) => write!(f, "{}", n),
            NumberOrString::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub to: String,
    pub amount: NumberOrString,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepRequest {
    pub from: String,
    pub deposit_id: NumberOrString,
    pub amount: NumberOrString,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZeroBalanceRequest {
    #[serde(default)]
    pub deposit_id: Option<NumberOrString>,
}

/// Result of a successful broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub success: bool,
    pub status: &'static str,
    pub tx_hash: String,
    pub nonce: u64,
    pub gas_price: String,
    pub gas_limit: u64,
    pub from: String,
    pub to: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_id: Option<u32>,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressResponse {
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAddressResponse {
    pub address: String,
    pub deposit_id: u32,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroBalanceAddress {
    pub address: String,
    pub derivation_index: u32,
    pub attempt_count: u32,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferHistory {
    pub address: String,
    pub from_block: u64,
    pub to_block: u64,
    pub transfers: Vec<TransferEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub chain_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_nonce: Option<u64>,
    pub hot_wallet: String,
}

/// Correlation id for a transfer: the caller's, or a fresh `req_<uuid>`.
pub fn resolve_request_id(provided: Option<&str>) -> String {
    match provided.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("req_{}", uuid::Uuid::new_v4().simple()),
    }
}

/// Parse a `0x`-prefixed 20-byte address. Mixed-case input must carry a
/// valid EIP-55 checksum.
pub fn parse_address(raw: &str) -> Result<Address, RelayError> {
    let trimmed = raw.trim();
    let invalid = || RelayError::InvalidAddress(trimmed.to_string());

    let hex_part = trimmed.strip_prefix("0x").ok_or_else(invalid)?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(trimmed, None).map_err(|_| invalid())
    } else {
        trimmed.to_lowercase().parse().map_err(|_| invalid())
    }
}

/// Parse a positive integer amount in base units.
pub fn parse_amount(raw: &NumberOrString) -> Result<U256, RelayError> {
    let amount = match raw {
        NumberOrString::Number(n) => n.as_u64().map(U256::from).ok_or_else(|| {
            RelayError::InvalidAmount(format!("{} is not a non-negative integer", n))
        })?,
        NumberOrString::Text(s) => {
            let s = s.trim();
            if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                return Err(RelayError::InvalidAmount(format!(
                    "'{}' is not a non-negative integer",
                    s
                )));
            }
            U256::from_str_radix(s, 10)
                .map_err(|_| RelayError::InvalidAmount(format!("'{}' is out of range", s)))?
        }
    };

    if amount.is_zero() {
        return Err(RelayError::InvalidAmount("amount must be greater than zero".into()));
    }
    Ok(amount)
}

/// Parse a deposit index given as a JSON number or string.
pub fn parse_deposit_id(raw: &NumberOrString) -> Result<u32, RelayError> {
    let index = match raw {
        NumberOrString::Number(n) => n
            .as_i64()
            .ok_or_else(|| KeyError::InvalidIndex(n.to_string()))
            .and_then(keys::check_index)?,
        NumberOrString::Text(s) => keys::parse_index(s)?,
    };
    Ok(index)
}

/// A `0x`-prefixed 32-byte hash, or `None` for anything else.
pub fn parse_tx_hash(raw: &str) -> Option<TxHash> {
    let hex_part = raw.trim().strip_prefix("0x")?;
    if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    raw.trim().parse().ok()
}
