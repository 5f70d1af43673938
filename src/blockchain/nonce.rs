//! Hot-wallet nonce sequencing.
//!
//! The counter is seeded once from the chain's pending transaction count and
//! afterwards advanced only locally. `next()` is synchronous: the read and the
//! increment happen under one `std::sync::Mutex` guard, which is `!Send` and
//! therefore cannot be held across an `.await` in a spawned handler.

use alloy::primitives::Address;
use std::sync::{Mutex, PoisonError};

use crate::blockchain::chain::ChainAccess;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::NonceFallback;
use crate::observability::metrics;

/// Process-wide nonce counter for the hot wallet.
#[derive(Debug, Default)]
pub struct NonceSequencer {
    next: Mutex<Option<u64>>,
}

impl NonceSequencer {
    /// Create an uninitialized sequencer. `next()` fails until
    /// [`initialize`](Self::initialize) succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequencer already seeded with `nonce`.
    pub fn starting_at(nonce: u64) -> Self {
        Self {
            next: Mutex::new(Some(nonce)),
        }
    }

    /// Seed the counter from the pending transaction count of `address`.
    ///
    /// On a quota/authorization rejection with `NonceFallback::Zero` the
    /// counter starts at 0; any other failure is returned and startup aborts.
    /// Returns the seeded value.
    pub async fn initialize(
        &self,
        chain: &dyn ChainAccess,
        address: Address,
        fallback: NonceFallback,
    ) -> BlockchainResult<u64> {
        let seed = match chain.pending_nonce(address).await {
            Ok(nonce) => {
                tracing::info!(%address, nonce, "Nonce counter initialized from pending count");
                nonce
            }
            Err(e) if e.is_quota() && fallback == NonceFallback::Zero => {
                tracing::error!(
                    %address,
                    error = %e,
                    "Pending nonce unavailable (quota/authorization); starting counter at 0"
                );
                0
            }
            Err(e) => {
                return Err(BlockchainError::Nonce(format!(
                    "failed to read pending nonce for {}: {}",
                    address, e
                )));
            }
        };

        *self.next.lock().unwrap_or_else(PoisonError::into_inner) = Some(seed);
        Ok(seed)
    }

    /// Hand out the next nonce. Never returns the same value twice.
    pub fn next(&self) -> BlockchainResult<u64> {
        let mut guard = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let nonce = guard.ok_or_else(|| {
            BlockchainError::Nonce("nonce sequencer not initialized".to_string())
        })?;
        *guard = Some(nonce + 1);
        drop(guard);

        metrics::record_nonce_issued();
        Ok(nonce)
    }

    /// The value the next call to `next()` would return, without consuming it.
    pub fn peek(&self) -> Option<u64> {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_initialized(&self) -> bool {
        self.peek().is_some()
    }
}
