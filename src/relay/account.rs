//! Read-only account queries: balances, incoming transfers, health.

use crate::relay::error::RelayError;
use crate::relay::types::{
    parse_address, AddressResponse, BalanceResponse, HealthReport, TransferEntry, TransferHistory,
};
use crate::relay::Relay;

impl Relay {
    pub fn receive_address(&self) -> AddressResponse {
        AddressResponse {
            address: self.hot_wallet.address().to_checksum(None),
        }
    }

    /// Token balance of `raw_address` in base units.
    pub async fn balance(&self, raw_address: &str) -> Result<BalanceResponse, RelayError> {
        let address = parse_address(raw_address)?;
        let balance = self
            .chain
            .token_balance(self.settings.token, address)
            .await?;

        Ok(BalanceResponse {
            address: address.to_checksum(None),
            balance: balance.to_string(),
        })
    }

    /// Incoming token transfers to `raw_address` over the last
    /// `lookback_blocks` blocks, oldest first.
    pub async fn recent_transfers(&self, raw_address: &str) -> Result<TransferHistory, RelayError> {
        let address = parse_address(raw_address)?;

        let to_block = self.chain.block_number().await?;
        let from_block = to_block.saturating_sub(self.settings.lookback_blocks);

        let logs = self
            .chain
            .transfer_logs(self.settings.token, address, from_block, to_block)
            .await?;

        tracing::debug!(
            %address,
            from_block,
            to_block,
            count = logs.len(),
            "Transfer history fetched"
        );

        let transfers = logs
            .into_iter()
            .map(|log| TransferEntry {
                tx_hash: log.tx_hash.map(|h| h.to_string()),
                from: log.from.to_checksum(None),
                to: log.to.to_checksum(None),
                value: log.value.to_string(),
                block_number: log.block_number,
            })
            .collect();

        Ok(TransferHistory {
            address: address.to_checksum(None),
            from_block,
            to_block,
            transfers,
        })
    }

    /// Liveness of the relay and its chain connection.
    pub async fn health(&self) -> HealthReport {
        let block_number = self.chain.block_number().await.ok();
        let chain_reachable = block_number.is_some();
        crate::observability::metrics::record_rpc_health(chain_reachable);

        let next_nonce = self.nonces.peek();
        let status = match (chain_reachable, next_nonce.is_some()) {
            (true, true) => "ok",
            _ => "degraded",
        };

        HealthReport {
            status,
            chain_reachable,
            block_number,
            next_nonce,
            hot_wallet: self.hot_wallet.address().to_checksum(None),
        }
    }
}
