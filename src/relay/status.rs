//! Transaction status lookup.
//!
//! Dispositions collapse to two statuses: `complete` once a receipt exists
//! (reverted or not), and `sent` for everything else. `detail` tells the
//! `sent` cases apart.

use alloy::primitives::TxHash;
use serde::Serialize;

use crate::blockchain::token;
use crate::blockchain::types::{ReceiptSummary, TxSummary};
use crate::relay::error::RelayError;
use crate::relay::types::parse_tx_hash;
use crate::relay::Relay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Sent,
    Complete,
}

/// Why a transaction is still reported as `sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDetail {
    /// Input is not a 32-byte hex hash; nothing was asked of the chain.
    MalformedHash,
    /// The node has the transaction but no receipt.
    Pending,
    /// The node has no record of the transaction.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub tx_hash: String,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StatusDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Token amount decoded from the transaction input, when it is a
    /// `transfer` on the relay's token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl StatusReport {
    pub fn sent(tx_hash: impl Into<String>, detail: StatusDetail) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            status: TxStatus::Sent,
            detail: Some(detail),
            block_number: None,
            gas_used: None,
            success: None,
            confirmations: None,
            from: None,
            to: None,
            amount: None,
            recipient: None,
        }
    }

    pub fn complete(receipt: &ReceiptSummary) -> Self {
        Self {
            tx_hash: receipt.tx_hash.to_string(),
            status: TxStatus::Complete,
            detail: None,
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used),
            success: Some(receipt.success),
            confirmations: None,
            from: Some(receipt.from.to_checksum(None)),
            to: receipt.to.map(|a| a.to_checksum(None)),
            amount: None,
            recipient: None,
        }
    }
}

impl Relay {
    /// Report the current disposition of `raw_hash`.
    ///
    /// Never reports an unknown or malformed hash as a failure. Upstream
    /// errors on the receipt or transaction lookup are returned as errors.
    pub async fn tx_status(&self, raw_hash: &str) -> Result<StatusReport, RelayError> {
        let Some(tx_hash) = parse_tx_hash(raw_hash) else {
            tracing::debug!(tx_hash = raw_hash, "Malformed transaction hash");
            return Ok(StatusReport::sent(raw_hash.trim(), StatusDetail::MalformedHash));
        };

        self.limiter.acquire().await;

        let Some(receipt) = self.chain.receipt(tx_hash).await? else {
            let detail = match self.chain.transaction(tx_hash).await? {
                Some(_) => StatusDetail::Pending,
                None => StatusDetail::NotFound,
            };
            tracing::debug!(%tx_hash, ?detail, "No receipt yet");
            return Ok(StatusReport::sent(tx_hash.to_string(), detail));
        };

        let mut report = StatusReport::complete(&receipt);
        report.confirmations = self.confirmations(&receipt).await;

        if let Some((recipient, amount)) = self.decode_token_transfer(tx_hash).await {
            report.recipient = Some(recipient);
            report.amount = Some(amount);
        }

        tracing::debug!(
            %tx_hash,
            block_number = ?receipt.block_number,
            success = receipt.success,
            "Transaction complete"
        );
        Ok(report)
    }

    async fn confirmations(&self, receipt: &ReceiptSummary) -> Option<u64> {
        let mined_at = receipt.block_number?;
        match self.chain.block_number().await {
            Ok(latest) => Some(latest.saturating_sub(mined_at)),
            Err(e) => {
                tracing::debug!(error = %e, "Latest block unavailable; omitting confirmations");
                None
            }
        }
    }

    /// Best effort: any lookup or decode failure yields `None`.
    async fn decode_token_transfer(&self, tx_hash: TxHash) -> Option<(String, String)> {
        let tx: TxSummary = match self.chain.transaction(tx_hash).await {
            Ok(tx) => tx?,
            Err(e) => {
                tracing::debug!(%tx_hash, error = %e, "Transaction lookup failed; skipping decode");
                return None;
            }
        };

        if tx.to != Some(self.settings.token) {
            return None;
        }
        let (recipient, amount) = token::decode_transfer(&tx.input)?;
        Some((recipient.to_checksum(None), amount.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    #[test]
    fn test_sent_serialization() {
        let report = StatusReport::sent("not-a-hash", StatusDetail::MalformedHash);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["detail"], "malformed_hash");
        assert_eq!(json["txHash"], "not-a-hash");
        assert!(json.get("blockNumber").is_none());
    }

    #[test]
    fn test_complete_from_reverted_receipt() {
        let receipt = ReceiptSummary {
            tx_hash: TxHash::repeat_byte(0xab),
            block_number: Some(100),
            gas_used: 21_000,
            success: false,
            from: Address::repeat_byte(0x01),
            to: Some(Address::repeat_byte(0x02)),
        };
        let json = serde_json::to_value(StatusReport::complete(&receipt)).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["success"], false);
        assert_eq!(json["blockNumber"], 100);
        assert_eq!(json["gasUsed"], 21_000);
        assert!(json.get("detail").is_none());
    }
}
