//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound chain call (broadcast, status lookup):
//!     → rate_limit.rs (space calls to the provider)
//!     → BlockchainClient (per-call timeout, provider failover)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries inside a request; failover across providers is the only
//!   multi-attempt path
//! - Spacing is process-wide, not per-client

pub mod rate_limit;

pub use rate_limit::UpstreamRateLimiter;
