//! Deposit-address lookup and the zero-balance address search.

use rand::Rng;

use crate::keys::{self, MAX_INDEX};
use crate::relay::error::RelayError;
use crate::relay::types::{DepositAddressResponse, ZeroBalanceAddress};
use crate::relay::Relay;

/// Start of the index range the zero-balance search draws from. Real deposit
/// ids live below it.
pub const ZERO_BALANCE_RANGE_START: u32 = 1 << 30;

impl Relay {
    /// The deterministic deposit address for `raw_id`.
    pub fn deposit_address(&self, raw_id: &str) -> Result<DepositAddressResponse, RelayError> {
        let index = keys::parse_index(raw_id)?;
        let derived = self.keys.derive_address(index)?;

        tracing::debug!(deposit_id = index, address = %derived.address, "Deposit address derived");

        Ok(DepositAddressResponse {
            address: derived.address.to_checksum(None),
            deposit_id: index,
            path: derived.path,
        })
    }

    /// Find a derived address holding none of the relay's token.
    ///
    /// Draws random indexes from `[2^30, 2^31)` and checks each balance, at
    /// most `zero_balance_max_attempts` times. A balance lookup failure ends
    /// the search.
    pub async fn zero_balance_address(
        &self,
        deposit_id: Option<&str>,
    ) -> Result<ZeroBalanceAddress, RelayError> {
        let max_attempts = self.settings.zero_balance_max_attempts;
        tracing::info!(deposit_id, max_attempts, "Searching for a zero-balance address");

        for attempt in 1..=max_attempts {
            let index = rand::thread_rng().gen_range(ZERO_BALANCE_RANGE_START..MAX_INDEX);
            let derived = self.keys.derive_address(index)?;

            let balance = self
                .chain
                .token_balance(self.settings.token, derived.address)
                .await?;

            if balance.is_zero() {
                tracing::info!(
                    deposit_id,
                    derivation_index = index,
                    attempt,
                    address = %derived.address,
                    "Zero-balance address found"
                );
                return Ok(ZeroBalanceAddress {
                    address: derived.address.to_checksum(None),
                    derivation_index: index,
                    attempt_count: attempt,
                    path: derived.path,
                });
            }

            tracing::debug!(
                attempt,
                derivation_index = index,
                %balance,
                "Candidate already funded"
            );
        }

        tracing::warn!(deposit_id, max_attempts, "Zero-balance search exhausted");
        Err(RelayError::SearchExhausted {
            attempts: max_attempts,
        })
    }
}
