//! Deterministic deposit-address derivation.
//!
//! Every deposit index maps to one child key under the BIP-44 Ethereum path
//! `m/44'/60'/0'/0/{index}`. The HD seed is `keccak256` of the master private
//! key, so the whole tree is a pure function of the one secret the relay
//! already holds. Derived keys are never cached.
//!
//! # Security
//! - Key bytes and the seed are wiped on drop (`Zeroizing`)
//! - No derived key, seed, or master key is ever logged or serialized

use alloy::primitives::{keccak256, Address};
use alloy::signers::local::PrivateKeySigner;
use bip32::{DerivationPath, XPrv};
use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

/// Path prefix; the deposit index is the final, non-hardened component.
pub const BASE_PATH: &str = "m/44'/60'/0'/0";

/// Exclusive upper bound on deposit indexes (first hardened index).
pub const MAX_INDEX: u32 = 1 << 31;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid deposit index '{0}': must be an integer in [0, 2^31)")]
    InvalidIndex(String),

    #[error("Derivation range starting at {start} with {count} entries exceeds 2^31")]
    RangeOverflow { start: u32, count: u32 },

    #[error("Invalid master key: {0}")]
    InvalidMasterKey(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),
}

/// A derived deposit address and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAddress {
    pub address: Address,
    pub path: String,
    pub index: u32,
}

/// Check that a signed integer is a usable deposit index.
pub fn check_index(index: i64) -> Result<u32, KeyError> {
    u32::try_from(index)
        .ok()
        .filter(|i| *i < MAX_INDEX)
        .ok_or_else(|| KeyError::InvalidIndex(index.to_string()))
}

/// Parse a deposit index from text (path segments, query values).
pub fn parse_index(raw: &str) -> Result<u32, KeyError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| KeyError::InvalidIndex(trimmed.to_string()))
        .and_then(check_index)
}

pub fn derivation_path(index: u32) -> String {
    format!("{}/{}", BASE_PATH, index)
}

/// HD key tree rooted at the master secret.
pub struct DepositKeys {
    seed: Zeroizing<[u8; 32]>,
}

impl DepositKeys {
    /// Build the tree from the hex-encoded master private key.
    pub fn from_master_key(master_key_hex: &str) -> Result<Self, KeyError> {
        let hex_str = master_key_hex.trim();
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);

        let bytes = Zeroizing::new(
            alloy::primitives::hex::decode(hex_str)
                .map_err(|e| KeyError::InvalidMasterKey(format!("not hex: {}", e)))?,
        );
        if bytes.len() != 32 {
            return Err(KeyError::InvalidMasterKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            seed: Zeroizing::new(keccak256(bytes.as_slice()).0),
        })
    }

    /// Address for `index`.
    pub fn derive_address(&self, index: u32) -> Result<DerivedAddress, KeyError> {
        let signer = self.derive_signer(index)?;
        Ok(DerivedAddress {
            address: signer.address(),
            path: derivation_path(index),
            index,
        })
    }

    /// Signing key for `index`. Callers keep it only as long as one signing.
    pub fn derive_signer(&self, index: u32) -> Result<PrivateKeySigner, KeyError> {
        if index >= MAX_INDEX {
            return Err(KeyError::InvalidIndex(index.to_string()));
        }

        let path: DerivationPath = derivation_path(index)
            .parse()
            .map_err(|e| KeyError::Derivation(format!("bad path: {}", e)))?;
        let xprv = XPrv::derive_from_path(self.seed.as_slice(), &path)
            .map_err(|e| KeyError::Derivation(e.to_string()))?;
        let key_bytes = Zeroizing::new(xprv.to_bytes());

        PrivateKeySigner::from_slice(key_bytes.as_slice())
            .map_err(|e| KeyError::Derivation(e.to_string()))
    }

    /// Whether `address` is the one derived at `index`.
    ///
    /// Comparison is case-insensitive; an unparseable address is `false`.
    pub fn verify(&self, index: u32, address: &str) -> Result<bool, KeyError> {
        let Ok(candidate) = address.trim().to_lowercase().parse::<Address>() else {
            return Ok(false);
        };
        Ok(self.derive_address(index)?.address == candidate)
    }

    /// `count` consecutive addresses starting at `start`.
    pub fn derive_range(&self, start: u32, count: u32) -> Result<Vec<DerivedAddress>, KeyError> {
        let end = start
            .checked_add(count)
            .filter(|end| *end <= MAX_INDEX)
            .ok_or(KeyError::RangeOverflow { start, count })?;

        (start..end).map(|i| self.derive_address(i)).collect()
    }
}

impl std::fmt::Debug for DepositKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositKeys").field("seed", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const MASTER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn keys() -> DepositKeys {
        DepositKeys::from_master_key(MASTER_KEY).unwrap()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = keys().derive_address(42).unwrap();
        let b = keys().derive_address(42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path, "m/44'/60'/0'/0/42");
        assert_eq!(a.index, 42);
    }

    #[test]
    fn test_prefixed_master_key_same_tree() {
        let prefixed = DepositKeys::from_master_key(&format!("0x{}", MASTER_KEY)).unwrap();
        assert_eq!(
            prefixed.derive_address(7).unwrap(),
            keys().derive_address(7).unwrap()
        );
    }

    #[test]
    fn test_different_master_keys_differ() {
        let other = DepositKeys::from_master_key(
            "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        )
        .unwrap();
        assert_ne!(
            other.derive_address(0).unwrap().address,
            keys().derive_address(0).unwrap().address
        );
    }

    #[test]
    fn test_signer_matches_address() {
        let keys = keys();
        let signer = keys.derive_signer(3).unwrap();
        assert_eq!(signer.address(), keys.derive_address(3).unwrap().address);
    }

    #[test]
    fn test_no_collisions_in_sample() {
        let derived = keys().derive_range(0, 256).unwrap();
        let unique: HashSet<_> = derived.iter().map(|d| d.address).collect();
        assert_eq!(unique.len(), 256);
        assert_eq!(derived[255].index, 255);
    }

    #[test]
    fn test_verify() {
        let keys = keys();
        let derived = keys.derive_address(42).unwrap();
        let checksummed = derived.address.to_checksum(None);

        assert!(keys.verify(42, &checksummed).unwrap());
        assert!(keys.verify(42, &checksummed.to_lowercase()).unwrap());
        assert!(keys.verify(42, &checksummed.to_uppercase().replacen("0X", "0x", 1)).unwrap());
        assert!(!keys.verify(43, &checksummed).unwrap());
        assert!(!keys.verify(42, "0x0000000000000000000000000000000000000000").unwrap());
        assert!(!keys.verify(42, "not-an-address").unwrap());
    }

    #[test]
    fn test_index_bounds() {
        assert_eq!(check_index(0).unwrap(), 0);
        assert_eq!(check_index((MAX_INDEX - 1) as i64).unwrap(), MAX_INDEX - 1);
        assert!(check_index(-1).is_err());
        assert!(check_index(MAX_INDEX as i64).is_err());

        assert_eq!(parse_index(" 42 ").unwrap(), 42);
        assert!(parse_index("4.2").is_err());
        assert!(parse_index("abc").is_err());
        assert!(parse_index("-5").is_err());
        assert!(parse_index("2147483648").is_err());

        assert!(keys().derive_address(MAX_INDEX).is_err());
    }

    #[test]
    fn test_range_overflow() {
        let keys = keys();
        assert!(matches!(
            keys.derive_range(MAX_INDEX - 2, 3),
            Err(KeyError::RangeOverflow { .. })
        ));
        assert_eq!(keys.derive_range(MAX_INDEX - 2, 2).unwrap().len(), 2);
        assert!(keys.derive_range(u32::MAX, 1).is_err());
    }

    #[test]
    fn test_bad_master_key() {
        assert!(DepositKeys::from_master_key("zz").is_err());
        assert!(DepositKeys::from_master_key("abcd").is_err());
    }

    #[test]
    fn test_debug_redacts_seed() {
        let rendered = format!("{:?}", keys());
        assert!(rendered.contains("redacted"));
    }
}
