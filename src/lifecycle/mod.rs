//! Process lifecycle: bring the relay up in a safe order, take it down
//! cleanly.
//!
//! ```text
//! startup.rs   config → chain id check → nonce seed → exporter → bind
//! signals.rs   SIGINT / SIGTERM → Shutdown::trigger
//! shutdown.rs  broadcast to the server, which drains in-flight requests
//! ```
//!
//! The listener is bound only after the nonce counter is seeded, so no
//! transfer can arrive before nonces are available.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
