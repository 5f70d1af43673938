//! Blockchain RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (block number, gas price, nonces, balances, receipts)
//! - Broadcast signed transactions
//! - Classify upstream failures (rate limit, quota, node rejection)

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::sol_types::SolEvent;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::chain::ChainAccess;
use crate::blockchain::token::{self, IERC20};
use crate::blockchain::types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ReceiptSummary, TransferLog, TxSummary,
};
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Succeeds even when the endpoint is unreachable; reachability is
    /// checked by [`verify_chain_id`](Self::verify_chain_id) and the nonce
    /// initialization at startup.
    pub fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e| BlockchainError::Rpc(format!("Invalid RPC URL: {}", e)))?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for (i, url_str) in config.failover_urls.iter().enumerate() {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(failover_idx = i, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            providers = providers.len(),
            chain_id = config.chain_id,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let actual = self.chain_id().await?;
        if actual != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Run one RPC call against each provider in turn until one answers.
    ///
    /// A JSON-RPC error response from a node is returned immediately: the
    /// node understood the request, and asking another node would only
    /// repeat the answer (or, for broadcasts, double-submit).
    async fn call<T, F, Fut>(&self, op: &'static str, f: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = None;

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    let node_response = e.as_error_resp().is_some();
                    let err = BlockchainError::classify(e.to_string(), node_response);
                    tracing::warn!(provider_idx = i, op, error = %err, "RPC error");
                    metrics::record_upstream_error(err.kind());
                    if node_response {
                        return Err(err);
                    }
                    last_error = Some(err);
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider");
                    metrics::record_upstream_error("timeout");
                    last_error = Some(BlockchainError::Timeout(self.config.rpc_timeout_secs));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BlockchainError::Rpc(format!("All RPC providers failed ({})", op))
        }))
    }
}

#[async_trait]
impl ChainAccess for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.call("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.call("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.call("eth_gasPrice", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.call("eth_getTransactionCount", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> BlockchainResult<U256> {
        let request = TransactionRequest::default()
            .with_to(token)
            .with_input(token::encode_balance_of(owner));

        let output: Bytes = self
            .call("eth_call", |p| {
                let request = request.clone();
                async move { p.call(request).await }
            })
            .await?;

        token::decode_balance(&output)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> BlockchainResult<u64> {
        self.call("eth_estimateGas", |p| {
            let request = request.clone();
            async move { p.estimate_gas(request).await }
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        self.call("eth_sendRawTransaction", |p| {
            let raw = raw.clone();
            async move {
                let pending = p.send_raw_transaction(&raw).await?;
                Ok::<_, alloy::transports::TransportError>(*pending.tx_hash())
            }
        })
        .await
    }

    async fn receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>> {
        let receipt = self
            .call("eth_getTransactionReceipt", |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;

        Ok(receipt.map(|r| ReceiptSummary {
            tx_hash: r.transaction_hash,
            block_number: r.block_number,
            gas_used: r.gas_used,
            success: r.status(),
            from: r.from,
            to: r.to,
        }))
    }

    async fn transaction(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxSummary>> {
        use alloy::consensus::Transaction as _;

        let tx = self
            .call("eth_getTransactionByHash", |p| async move {
                p.get_transaction_by_hash(tx_hash).await
            })
            .await?;

        Ok(tx.map(|tx| {
            let envelope = tx.inner.inner();
            TxSummary {
                tx_hash,
                from: tx.inner.signer(),
                to: envelope.to(),
                input: envelope.input().clone(),
                block_number: tx.block_number,
            }
        }))
    }

    async fn transfer_logs(
        &self,
        token: Address,
        to: Address,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<TransferLog>> {
        let filter = Filter::new()
            .address(token)
            .event(IERC20::Transfer::SIGNATURE)
            .topic2(to.into_word())
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .call("eth_getLogs", |p| {
                let filter = filter.clone();
                async move { p.get_logs(&filter).await }
            })
            .await?;

        let mut transfers = Vec::with_capacity(logs.len());
        for log in logs {
            match log.log_decode::<IERC20::Transfer>() {
                Ok(decoded) => {
                    let event = &decoded.inner.data;
                    transfers.push(TransferLog {
                        tx_hash: log.transaction_hash,
                        from: event.from,
                        to: event.to,
                        value: event.value,
                        block_number: log.block_number,
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping undecodable Transfer log");
                }
            }
        }

        Ok(transfers)
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_host", &self.config.rpc_host())
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            // Nothing listens on port 9; connections are refused quickly.
            rpc_url: "http://127.0.0.1:9".to_string(),
            chain_id: 31337, // Anvil default
            rpc_timeout_secs: 2,
            ..BlockchainConfig::default()
        }
    }

    #[test]
    fn test_client_creation() {
        // Creation does no I/O, so an unreachable endpoint is fine.
        assert!(BlockchainClient::new(test_config()).is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::new(config).unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[test]
    fn test_debug_hides_rpc_credentials() {
        let mut config = test_config();
        config.rpc_url = "https://sepolia.infura.io/v3/secret-project-key".to_string();
        let client = BlockchainClient::new(config).unwrap();

        let rendered = format!("{:?}", client);
        assert!(rendered.contains("sepolia.infura.io"));
        assert!(!rendered.contains("secret-project-key"));
    }

    #[tokio::test]
    async fn test_rpc_failover() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:10".to_string());

        let client = BlockchainClient::new(config).unwrap();

        // Both endpoints refuse connections; the client must try both and
        // report a transport error rather than panic.
        let result = client.chain_id().await;
        assert!(matches!(
            result,
            Err(BlockchainError::Rpc(_)) | Err(BlockchainError::Timeout(_))
        ));
    }
}
