//! Wallet management and transaction signing.
//!
//! # Security
//! - The master private key is loaded ONLY from an environment variable
//! - Keys are never logged or serialized
//! - Nonces are NOT tracked here; the hot wallet's counter lives in
//!   [`NonceSequencer`](crate::blockchain::nonce::NonceSequencer)

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable name for the master private key.
pub const MASTER_KEY_ENV_VAR: &str = "RELAY_MASTER_PRIVATE_KEY";

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// Hash the network will know the transaction by.
    pub hash: TxHash,
    /// EIP-2718 encoded bytes for `eth_sendRawTransaction`.
    pub raw: Bytes,
}

/// A signing account bound to one chain.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        Ok(Self::from_signer(signer, chain_id))
    }

    /// Wrap an existing signer.
    pub fn from_signer(signer: PrivateKeySigner, chain_id: u64) -> Self {
        let signer = signer.with_chain_id(Some(chain_id));
        Self { signer, chain_id }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a fully populated transaction request.
    ///
    /// The request must carry nonce, gas price and gas limit; `from` and
    /// the chain ID are filled in from this wallet.
    pub async fn sign_transaction(
        &self,
        request: TransactionRequest,
    ) -> BlockchainResult<SignedTransaction> {
        let request = request
            .with_from(self.address())
            .with_chain_id(self.chain_id);

        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = request
            .build(&wallet)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Transaction signing failed: {}", e)))?;

        Ok(SignedTransaction {
            hash: *envelope.tx_hash(),
            raw: envelope.encoded_2718().into(),
        })
    }
}

/// Read the master private key from the environment.
pub fn read_master_key() -> BlockchainResult<String> {
    std::env::var(MASTER_KEY_ENV_VAR).map_err(|_| {
        BlockchainError::Wallet(format!("Environment variable {} not set", MASTER_KEY_ENV_VAR))
    })
}
