//! Logs and metrics.
//!
//! ```text
//! relay / blockchain / http
//!     → logging.rs: tracing events with request_id, nonce, tx_hash fields
//!     → metrics.rs: counters and histograms, scraped from the exporter port
//! ```
//!
//! Secret material (master key, derived keys, HD seed) is never a field on
//! any event. Recording metrics before the exporter is installed is a no-op.

pub mod logging;
pub mod metrics;
