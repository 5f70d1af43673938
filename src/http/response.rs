//! Error responses.
//!
//! Every failure leaves as `{success:false, error, errorType, ...}`. The
//! status code separates caller mistakes (4xx) from upstream trouble (502),
//! a relay that is not ready (503) and timeouts (504).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::blockchain::BlockchainError;
use crate::relay::RelayError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    error_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// A [`RelayError`] on its way to the caller, with the correlation id when
/// the operation has one.
#[derive(Debug)]
pub struct ApiError {
    error: RelayError,
    request_id: Option<String>,
}

impl ApiError {
    pub fn new(error: RelayError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.error)
    }
}

impl From<RelayError> for ApiError {
    fn from(error: RelayError) -> Self {
        Self::new(error)
    }
}

fn status_for(error: &RelayError) -> StatusCode {
    match error {
        RelayError::AddressMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        RelayError::NotInitialized | RelayError::SearchExhausted { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RelayError::RequestTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RelayError::Broadcast { source, .. } | RelayError::Chain(source) => match source {
            BlockchainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            BlockchainError::GasPriceTooHigh { .. } | BlockchainError::Nonce(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BlockchainError::Wallet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.error.error_type();

        if self.error.is_client_error() {
            tracing::warn!(
                request_id = self.request_id.as_deref(),
                error_type,
                error = %self.error,
                "Request rejected"
            );
        } else {
            tracing::error!(
                request_id = self.request_id.as_deref(),
                error_type,
                status = status.as_u16(),
                error = %self.error,
                "Request failed"
            );
        }

        let body = ErrorBody {
            success: false,
            error: self.error.to_string(),
            error_type,
            tx_hash: self.error.tx_hash().map(|h| h.to_string()),
            nonce: self.error.nonce(),
            request_id: self.request_id,
        };

        (status, Json(body)).into_response()
    }
}
