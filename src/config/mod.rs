//! Relay configuration.
//!
//! ```text
//! optional TOML file ──▶ loader.rs ──▶ RELAY_* env overrides ──▶ validation.rs
//!                                                                   │
//!                                              RelayConfig (read-only after load)
//! ```
//!
//! Every section falls back to defaults, so an empty file (or none) plus
//! `RELAY_RPC_URL` is a working setup. The master key is never part of the
//! config; it comes from `RELAY_MASTER_PRIVATE_KEY` alone.

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    BlockchainConfig, ListenerConfig, NonceFallback, ObservabilityConfig, RelayConfig, TokenConfig,
};
