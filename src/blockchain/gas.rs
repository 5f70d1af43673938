//! Cached network gas price with staleness and fallback policy.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::blockchain::chain::ChainAccess;
use crate::blockchain::types::BlockchainError;
use crate::observability::metrics;

const GWEI: u128 = 1_000_000_000;

/// Used when the chain cannot be asked and nothing is cached.
pub const MAINNET_FALLBACK_GAS_PRICE: u128 = 50 * GWEI;
pub const TESTNET_FALLBACK_GAS_PRICE: u128 = 5 * GWEI;

/// A cached price and when it was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedGasPrice {
    pub price: u128,
    pub refreshed_at: Instant,
}

/// What the cache holds at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Fresh(u128),
    Stale(u128),
    Empty,
}

/// Classify a cache entry. Fresh iff its age is strictly below `ttl`.
pub fn cache_state(entry: Option<CachedGasPrice>, now: Instant, ttl: Duration) -> CacheState {
    match entry {
        None => CacheState::Empty,
        Some(e) if now.saturating_duration_since(e.refreshed_at) < ttl => {
            CacheState::Fresh(e.price)
        }
        Some(e) => CacheState::Stale(e.price),
    }
}

pub fn fallback_gas_price(chain_id: u64) -> u128 {
    if chain_id == 1 {
        MAINNET_FALLBACK_GAS_PRICE
    } else {
        TESTNET_FALLBACK_GAS_PRICE
    }
}

/// Log level for a failed refresh.
///
/// Throttling and timeouts clear up on their own and are covered by the
/// stale value or the fallback. A quota rejection, like any error the
/// relay cannot ride out, needs an operator.
fn refresh_failure_level(e: &BlockchainError) -> tracing::Level {
    if e.is_recoverable() && !e.is_quota() {
        tracing::Level::WARN
    } else {
        tracing::Level::ERROR
    }
}

/// Multiply `price` by `multiplier`, in whole basis points.
pub fn apply_buffer(price: u128, multiplier: f64) -> u128 {
    let bps = (multiplier * 10_000.0).round().max(0.0) as u128;
    price.saturating_mul(bps) / 10_000
}

/// Gas price cache shared by every transfer.
///
/// The mutex is never held across the upstream fetch; two concurrent
/// refreshes of a stale entry may both hit the node, and the later write wins.
#[derive(Debug)]
pub struct GasPriceCache {
    entry: Mutex<Option<CachedGasPrice>>,
    ttl: Duration,
    multiplier: f64,
    chain_id: u64,
}

impl GasPriceCache {
    pub fn new(ttl: Duration, multiplier: f64, chain_id: u64) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
            multiplier,
            chain_id,
        }
    }

    pub fn state(&self) -> CacheState {
        cache_state(self.snapshot(), Instant::now(), self.ttl)
    }

    /// Current buffered gas price in wei.
    ///
    /// Fresh entries are served without an upstream call. Otherwise the node
    /// is asked once; on failure the stale value (timestamp untouched) or the
    /// network fallback is returned.
    pub async fn get_price(&self, chain: &dyn ChainAccess) -> u128 {
        let previous = match self.state() {
            CacheState::Fresh(price) => {
                metrics::record_gas_price_lookup("cached");
                return price;
            }
            CacheState::Stale(price) => Some(price),
            CacheState::Empty => None,
        };

        match chain.gas_price().await {
            Ok(network_price) => {
                let price = apply_buffer(network_price, self.multiplier);
                let entry = CachedGasPrice {
                    price,
                    refreshed_at: Instant::now(),
                };
                *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);
                tracing::debug!(network_price, price, "Gas price refreshed");
                metrics::record_gas_price_lookup("refreshed");
                price
            }
            Err(e) => {
                if refresh_failure_level(&e) == tracing::Level::WARN {
                    tracing::warn!(error = %e, kind = e.kind(), "Gas price fetch throttled");
                } else {
                    tracing::error!(error = %e, kind = e.kind(), "Gas price fetch failed");
                }

                match previous {
                    Some(price) => {
                        metrics::record_gas_price_lookup("stale");
                        price
                    }
                    None => {
                        metrics::record_gas_price_lookup("fallback");
                        fallback_gas_price(self.chain_id)
                    }
                }
            }
        }
    }

    fn snapshot(&self) -> Option<CachedGasPrice> {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn set_entry(&self, entry: Option<CachedGasPrice>) {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = entry;
    }
}
