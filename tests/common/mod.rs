//! Shared utilities for integration tests: an in-memory chain and helpers to
//! build a relay or a running HTTP server around it.
#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use token_relay::blockchain::types::{
    BlockchainError, BlockchainResult, ReceiptSummary, TransferLog, TxSummary,
};
use token_relay::blockchain::ChainAccess;
use token_relay::config::RelayConfig;
use token_relay::http::HttpServer;
use token_relay::lifecycle::Shutdown;
use token_relay::relay::Relay;

/// Anvil's first account.
pub const MASTER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const HOT_WALLET: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const TOKEN: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
pub const CHAIN_ID: u64 = 31337;
pub const GWEI: u128 = 1_000_000_000;

pub fn token_address() -> Address {
    TOKEN.parse().unwrap()
}

/// In-memory chain. Every field can be adjusted while a test runs.
pub struct MockChain {
    pub block_number: AtomicU64,
    /// `None` makes `gas_price` fail with a transport error.
    pub gas_price: Mutex<Option<u128>>,
    pub gas_price_calls: AtomicUsize,
    pub pending_nonces: Mutex<HashMap<Address, u64>>,
    /// When set, `pending_nonce` fails with this message (classified).
    pub nonce_failure: Mutex<Option<String>>,
    pub balances: Mutex<HashMap<Address, U256>>,
    pub default_balance: Mutex<U256>,
    pub balance_calls: AtomicUsize,
    pub receipts: Mutex<HashMap<TxHash, ReceiptSummary>>,
    pub transactions: Mutex<HashMap<TxHash, TxSummary>>,
    pub receipt_calls: AtomicUsize,
    pub broadcasts: Mutex<Vec<Bytes>>,
    /// When set, broadcasts are rejected by the "node" with this message.
    pub broadcast_failure: Mutex<Option<String>>,
    pub gas_estimate: AtomicU64,
    pub estimate_calls: AtomicUsize,
    pub logs: Mutex<Vec<TransferLog>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            block_number: AtomicU64::new(1_000),
            gas_price: Mutex::new(Some(10 * GWEI)),
            gas_price_calls: AtomicUsize::new(0),
            pending_nonces: Mutex::new(HashMap::new()),
            nonce_failure: Mutex::new(None),
            balances: Mutex::new(HashMap::new()),
            default_balance: Mutex::new(U256::ZERO),
            balance_calls: AtomicUsize::new(0),
            receipts: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
            receipt_calls: AtomicUsize::new(0),
            broadcasts: Mutex::new(Vec::new()),
            broadcast_failure: Mutex::new(None),
            gas_estimate: AtomicU64::new(65_000),
            estimate_calls: AtomicUsize::new(0),
            logs: Mutex::new(Vec::new()),
        }
    }
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_pending_nonce(&self, address: Address, nonce: u64) {
        self.pending_nonces.lock().unwrap().insert(address, nonce);
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.balances.lock().unwrap().insert(address, balance);
    }

    pub fn set_default_balance(&self, balance: U256) {
        *self.default_balance.lock().unwrap() = balance;
    }

    pub fn add_receipt(&self, receipt: ReceiptSummary) {
        self.receipts.lock().unwrap().insert(receipt.tx_hash, receipt);
    }

    pub fn add_transaction(&self, tx: TxSummary) {
        self.transactions.lock().unwrap().insert(tx.tx_hash, tx);
    }

    pub fn reject_broadcasts(&self, message: &str) {
        *self.broadcast_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    /// Every broadcast transaction, decoded, in arrival order.
    pub fn decoded_broadcasts(&self) -> Vec<TxEnvelope> {
        self.broadcasts
            .lock()
            .unwrap()
            .iter()
            .map(|raw| TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap())
            .collect()
    }
}

#[async_trait]
impl ChainAccess for MockChain {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(CHAIN_ID)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.block_number.load(Ordering::SeqCst))
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.gas_price_calls.fetch_add(1, Ordering::SeqCst);
        self.gas_price
            .lock()
            .unwrap()
            .ok_or_else(|| BlockchainError::Rpc("connection refused".into()))
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        if let Some(message) = self.nonce_failure.lock().unwrap().clone() {
            return Err(BlockchainError::classify(message, false));
        }
        Ok(self
            .pending_nonces
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    async fn token_balance(&self, _token: Address, owner: Address) -> BlockchainResult<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let balances = self.balances.lock().unwrap();
        Ok(balances
            .get(&owner)
            .copied()
            .unwrap_or(*self.default_balance.lock().unwrap()))
    }

    async fn estimate_gas(&self, _request: TransactionRequest) -> BlockchainResult<u64> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.gas_estimate.load(Ordering::SeqCst))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        if let Some(message) = self.broadcast_failure.lock().unwrap().clone() {
            return Err(BlockchainError::Node(message));
        }
        let hash = keccak256(&raw);
        self.broadcasts.lock().unwrap().push(raw);
        Ok(hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.receipts.lock().unwrap().get(&tx_hash).cloned())
    }

    async fn transaction(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxSummary>> {
        Ok(self.transactions.lock().unwrap().get(&tx_hash).cloned())
    }

    async fn transfer_logs(
        &self,
        _token: Address,
        to: Address,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<TransferLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.to == to)
            .filter(|log| {
                log.block_number
                    .map_or(true, |b| b >= from_block && b <= to_block)
            })
            .cloned()
            .collect())
    }
}

/// Config for tests: local chain, tiny rate-limit gap, no metrics listener.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.blockchain.chain_id = CHAIN_ID;
    config.blockchain.rate_limit_interval_ms = 1;
    config.token.contract_address = TOKEN.to_string();
    config.observability.metrics_enabled = false;
    config
}

/// An initialized relay over `chain`.
pub async fn relay_with(chain: Arc<MockChain>, config: &RelayConfig) -> Arc<Relay> {
    let relay = Relay::new(config, chain, MASTER_KEY).unwrap();
    relay.initialize().await.unwrap();
    Arc::new(relay)
}

/// A relay server on an ephemeral port. Dropping it stops the server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_server(relay: Arc<Relay>, config: RelayConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, relay);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
