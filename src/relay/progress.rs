//! How far a transfer got before it returned, failed or was cancelled.

use alloy::primitives::TxHash;
use std::sync::{Arc, Mutex, PoisonError};

/// What a transfer has committed to on chain so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Committed {
    /// Set once a nonce is assigned; a gap if nothing is ever broadcast.
    pub nonce: Option<u64>,
    /// Set once the transaction is signed, before broadcast.
    pub tx_hash: Option<TxHash>,
}

/// Correlation id plus the commitments of one transfer.
///
/// Clones share state. The HTTP layer keeps a clone so a request dropped
/// by its timeout can still report the nonce and hash it already used.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    request_id: Arc<str>,
    committed: Arc<Mutex<Committed>>,
}

impl TransferProgress {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Arc::from(request_id.into()),
            committed: Arc::default(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn committed(&self) -> Committed {
        *self.lock()
    }

    pub(crate) fn record_nonce(&self, nonce: u64) {
        self.lock().nonce = Some(nonce);
    }

    pub(crate) fn record_tx_hash(&self, tx_hash: TxHash) {
        self.lock().tx_hash = Some(tx_hash);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Committed> {
        self.committed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_commitments() {
        let progress = TransferProgress::new("req_1");
        let observer = progress.clone();
        assert_eq!(observer.committed(), Committed::default());

        progress.record_nonce(4);
        progress.record_tx_hash(TxHash::repeat_byte(0x0a));

        assert_eq!(observer.request_id(), "req_1");
        assert_eq!(
            observer.committed(),
            Committed {
                nonce: Some(4),
                tx_hash: Some(TxHash::repeat_byte(0x0a)),
            }
        );
    }
}
