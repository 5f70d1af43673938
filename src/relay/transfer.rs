//! Outbound token transfers: hot-wallet sends and deposit sweeps.
//!
//! Both return as soon as the node accepts the transaction. Mining is
//! observed afterwards through the status lookup.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::token;
use crate::blockchain::{BlockchainError, SignedTransaction, Wallet};
use crate::observability::metrics;
use crate::relay::error::RelayError;
use crate::relay::progress::TransferProgress;
use crate::relay::types::{
    parse_address, parse_amount, parse_deposit_id, SendRequest, SweepRequest, TransferReceipt,
};
use crate::relay::Relay;

impl Relay {
    /// Send tokens from the hot wallet.
    ///
    /// Order: validate, gas price, nonce, sign, rate-limit, broadcast. A
    /// failure after the nonce is taken leaves a gap; the nonce is never
    /// handed out again. The nonce and signed hash are recorded in
    /// `progress` as soon as they exist.
    pub async fn send(
        &self,
        request: &SendRequest,
        progress: &TransferProgress,
    ) -> Result<TransferReceipt, RelayError> {
        let request_id = progress.request_id();
        let to = parse_address(&request.to)?;
        let amount = parse_amount(&request.amount)?;

        tracing::info!(request_id, %to, %amount, "Starting token transfer");

        let gas_price = self.gas.get_price(self.chain.as_ref()).await;
        self.check_gas_ceiling(gas_price)?;
        let gas_limit = self.settings.transfer_gas_limit;

        let nonce = self.nonces.next().map_err(|_| RelayError::NotInitialized)?;
        progress.record_nonce(nonce);

        let tx = self.transfer_request(to, amount, nonce, gas_price, gas_limit);
        let signed = sign(&self.hot_wallet, tx, nonce).await?;
        progress.record_tx_hash(signed.hash);
        tracing::debug!(request_id, nonce, tx_hash = %signed.hash, gas_price, "Transfer signed");

        let tx_hash = self.broadcast("send", signed, nonce, request_id).await?;

        Ok(TransferReceipt {
            success: true,
            status: "sent",
            tx_hash: tx_hash.to_string(),
            nonce,
            gas_price: gas_price.to_string(),
            gas_limit,
            from: self.hot_wallet.address().to_checksum(None),
            to: to.to_checksum(None),
            amount: amount.to_string(),
            deposit_id: None,
            request_id: request_id.to_string(),
        })
    }

    /// Move tokens from a deposit address back to the hot wallet.
    ///
    /// The `(deposit_id, from)` pair is checked against key derivation before
    /// anything is signed. The deposit key lives only for this call.
    pub async fn sweep(
        &self,
        request: &SweepRequest,
        progress: &TransferProgress,
    ) -> Result<TransferReceipt, RelayError> {
        let request_id = progress.request_id();
        let deposit_id = parse_deposit_id(&request.deposit_id)?;
        let from = parse_address(&request.from)?;
        let amount = parse_amount(&request.amount)?;

        if !self.keys.verify(deposit_id, &request.from)? {
            tracing::warn!(
                request_id,
                deposit_id,
                %from,
                "Sweep rejected: address does not match deposit"
            );
            return Err(RelayError::AddressMismatch {
                deposit_id,
                address: request.from.trim().to_string(),
            });
        }

        let to = self.hot_wallet.address();
        tracing::info!(request_id, deposit_id, %from, %amount, "Starting sweep");

        let nonce = self.chain.pending_nonce(from).await?;
        progress.record_nonce(nonce);
        let gas_price = self.gas.get_price(self.chain.as_ref()).await;
        self.check_gas_ceiling(gas_price)?;

        let estimate = TransactionRequest::default()
            .with_from(from)
            .with_to(self.settings.token)
            .with_input(token::encode_transfer(to, amount));
        let gas_limit = self
            .chain
            .estimate_gas(estimate)
            .await
            .map_err(|source| RelayError::Broadcast {
                source,
                nonce: Some(nonce),
                tx_hash: None,
            })?;

        let tx = self.transfer_request(to, amount, nonce, gas_price, gas_limit);
        let signed = {
            let deposit_wallet = Wallet::from_signer(
                self.keys.derive_signer(deposit_id)?,
                self.settings.chain_id,
            );
            sign(&deposit_wallet, tx, nonce).await?
        };
        progress.record_tx_hash(signed.hash);
        tracing::debug!(request_id, deposit_id, nonce, tx_hash = %signed.hash, "Sweep signed");

        let tx_hash = self.broadcast("sweep", signed, nonce, request_id).await?;

        Ok(TransferReceipt {
            success: true,
            status: "sent",
            tx_hash: tx_hash.to_string(),
            nonce,
            gas_price: gas_price.to_string(),
            gas_limit,
            from: from.to_checksum(None),
            to: to.to_checksum(None),
            amount: amount.to_string(),
            deposit_id: Some(deposit_id),
            request_id: request_id.to_string(),
        })
    }

    fn check_gas_ceiling(&self, gas_price: u128) -> Result<(), RelayError> {
        if gas_price > self.settings.max_gas_price_wei {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: u64::try_from(gas_price / 1_000_000_000).unwrap_or(u64::MAX),
                max_gwei: u64::try_from(self.settings.max_gas_price_wei / 1_000_000_000)
                    .unwrap_or(u64::MAX),
            }
            .into());
        }
        Ok(())
    }

    /// Legacy `transfer(to, amount)` call on the token contract.
    fn transfer_request(
        &self,
        to: Address,
        amount: U256,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
    ) -> TransactionRequest {
        TransactionRequest::default()
            .with_to(self.settings.token)
            .with_value(U256::ZERO)
            .with_input(token::encode_transfer(to, amount))
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit)
    }

    async fn broadcast(
        &self,
        kind: &'static str,
        signed: SignedTransaction,
        nonce: u64,
        request_id: &str,
    ) -> Result<TxHash, RelayError> {
        self.limiter.acquire().await;

        match self.chain.send_raw_transaction(signed.raw).await {
            Ok(tx_hash) => {
                if tx_hash != signed.hash {
                    tracing::warn!(
                        request_id,
                        signed = %signed.hash,
                        reported = %tx_hash,
                        "Node reported a different transaction hash"
                    );
                }
                tracing::info!(request_id, kind, nonce, %tx_hash, "Transaction broadcast");
                metrics::record_broadcast(kind, "sent");
                Ok(tx_hash)
            }
            Err(source) => {
                let category = source.failure_category();
                tracing::error!(
                    request_id,
                    kind,
                    nonce,
                    tx_hash = %signed.hash,
                    error = %source,
                    error_type = category,
                    "Broadcast failed"
                );
                metrics::record_broadcast(kind, category);
                Err(RelayError::Broadcast {
                    source,
                    nonce: Some(nonce),
                    tx_hash: Some(signed.hash),
                })
            }
        }
    }
}

async fn sign(
    wallet: &Wallet,
    tx: TransactionRequest,
    nonce: u64,
) -> Result<SignedTransaction, RelayError> {
    wallet
        .sign_transaction(tx)
        .await
        .map_err(|source| RelayError::Broadcast {
            source,
            nonce: Some(nonce),
            tx_hash: None,
        })
}
