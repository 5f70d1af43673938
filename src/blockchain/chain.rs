//! The upstream chain-access seam.
//!
//! Everything the relay needs from a JSON-RPC provider goes through
//! [`ChainAccess`]. The production implementation is
//! [`BlockchainClient`](crate::blockchain::BlockchainClient); tests plug in an
//! in-memory chain.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, ReceiptSummary, TransferLog, TxSummary};

#[async_trait]
pub trait ChainAccess: Send + Sync + 'static {
    /// Chain ID reported by the node.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// Latest block number.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Current network gas price in wei, as reported (no buffer applied).
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// Transaction count of `address` including pending transactions.
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// ERC-20 `balanceOf(owner)` on `token`, in base units.
    async fn token_balance(&self, token: Address, owner: Address) -> BlockchainResult<U256>;

    /// Gas estimate for the given call.
    async fn estimate_gas(&self, request: TransactionRequest) -> BlockchainResult<u64>;

    /// Broadcast a signed, EIP-2718 encoded transaction.
    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash>;

    /// Receipt for a mined transaction, `None` if not mined (or unknown).
    async fn receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>>;

    /// Transaction by hash, mined or pending; `None` if the node has no record.
    async fn transaction(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxSummary>>;

    /// `Transfer` events on `token` whose recipient is `to`, within the
    /// inclusive block range.
    async fn transfer_logs(
        &self,
        token: Address,
        to: Address,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<TransferLog>>;
}
