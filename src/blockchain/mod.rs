//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (master key) + config (RPC URL, chain ID)
//!     → wallet.rs (hot wallet, transaction signing)
//!     → chain.rs (ChainAccess seam)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → nonce.rs / gas.rs (hot-wallet nonce counter, cached gas price)
//!     → token.rs (ERC-20 calldata and events)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod chain;
pub mod client;
pub mod gas;
pub mod nonce;
pub mod token;
pub mod types;
pub mod wallet;

pub use chain::ChainAccess;
pub use client::BlockchainClient;
pub use gas::GasPriceCache;
pub use nonce::NonceSequencer;
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult};
pub use wallet::{SignedTransaction, Wallet};
