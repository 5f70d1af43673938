//! Service-level errors.

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::keys::KeyError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Address {address} does not belong to deposit {deposit_id}")]
    AddressMismatch { deposit_id: u32, address: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Relay not initialized: nonce counter has not been seeded")]
    NotInitialized,

    /// The request ran out of time. For a transfer, `nonce` and `tx_hash`
    /// are whatever it had committed to; the broadcast may still land.
    #[error("Request timed out after {seconds} seconds")]
    RequestTimeout {
        seconds: u64,
        nonce: Option<u64>,
        tx_hash: Option<TxHash>,
    },

    #[error("No zero-balance address found after {attempts} attempts")]
    SearchExhausted { attempts: u32 },

    /// A transfer failed at or after nonce assignment.
    #[error("Transfer failed: {source}")]
    Broadcast {
        source: BlockchainError,
        nonce: Option<u64>,
        tx_hash: Option<TxHash>,
    },

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

impl RelayError {
    /// The `errorType` reported to callers.
    pub fn error_type(&self) -> &'static str {
        match self {
            RelayError::InvalidAddress(_) => "invalid_address",
            RelayError::InvalidAmount(_) => "invalid_amount",
            RelayError::Key(KeyError::InvalidIndex(_) | KeyError::RangeOverflow { .. }) => {
                "invalid_index"
            }
            RelayError::Key(_) => "key_error",
            RelayError::AddressMismatch { .. } => "address_mismatch",
            RelayError::BadRequest(_) => "invalid_request",
            RelayError::NotInitialized => "not_initialized",
            RelayError::SearchExhausted { .. } => "search_exhausted",
            RelayError::RequestTimeout { .. } => "timeout",
            RelayError::Broadcast { source, .. } => source.failure_category(),
            RelayError::Chain(e) => e.failure_category(),
        }
    }

    /// Caller mistakes, rejected before any upstream call.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidAddress(_)
                | RelayError::InvalidAmount(_)
                | RelayError::Key(KeyError::InvalidIndex(_) | KeyError::RangeOverflow { .. })
                | RelayError::AddressMismatch { .. }
                | RelayError::BadRequest(_)
        )
    }

    pub fn nonce(&self) -> Option<u64> {
        match self {
            RelayError::Broadcast { nonce, .. } | RelayError::RequestTimeout { nonce, .. } => {
                *nonce
            }
            _ => None,
        }
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            RelayError::Broadcast { tx_hash, .. } | RelayError::RequestTimeout { tx_hash, .. } => {
                *tx_hash
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        assert_eq!(RelayError::InvalidAddress("x".into()).error_type(), "invalid_address");
        assert_eq!(
            RelayError::Key(KeyError::InvalidIndex("-1".into())).error_type(),
            "invalid_index"
        );
        assert_eq!(RelayError::SearchExhausted { attempts: 100 }.error_type(), "search_exhausted");

        let err = RelayError::Broadcast {
            source: BlockchainError::Node("insufficient funds for gas * price + value".into()),
            nonce: Some(4),
            tx_hash: None,
        };
        assert_eq!(err.error_type(), "insufficient_funds");
        assert_eq!(err.nonce(), Some(4));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_timeout_carries_commitments() {
        let err = RelayError::RequestTimeout {
            seconds: 30,
            nonce: Some(9),
            tx_hash: Some(TxHash::repeat_byte(0x22)),
        };
        assert_eq!(err.error_type(), "timeout");
        assert_eq!(err.nonce(), Some(9));
        assert_eq!(err.tx_hash(), Some(TxHash::repeat_byte(0x22)));
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }

    #[test]
    fn test_client_errors() {
        assert!(RelayError::InvalidAmount("0".into()).is_client_error());
        let mismatch = RelayError::AddressMismatch {
            deposit_id: 1,
            address: "0x".into(),
        };
        assert!(mismatch.is_client_error());
        assert!(!RelayError::NotInitialized.is_client_error());
        assert!(!RelayError::Chain(BlockchainError::Timeout(10)).is_client_error());
    }
}
