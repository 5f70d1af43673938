//! Custodial ERC-20 payment relay.
//!
//! Issues deterministic per-customer deposit addresses, sends token transfers
//! from a single hot wallet, sweeps deposit addresses back into it, and
//! reports the on-chain status of submitted transactions over JSON/HTTP.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod keys;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod resilience;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::Relay;
