//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all relay endpoints
//! - Wire up middleware (request ID, tracing, timeout, metrics, body limit)
//! - Serve on a bound listener until shutdown is signalled

use axum::extract::{DefaultBodyLimit, MatchedPath, Request, State};
use axum::http::HeaderName;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::http::handlers;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::relay::{Relay, RelayError, TransferProgress};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub request_timeout: Duration,
}

/// Where a transfer handler leaves its [`TransferProgress`] so the timeout
/// in [`track_request`] can report it. Empty for every other route.
#[derive(Debug, Clone, Default)]
pub struct TransferSlot(Arc<Mutex<Option<TransferProgress>>>);

impl TransferSlot {
    pub fn attach(&self, progress: TransferProgress) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(progress);
    }

    pub fn get(&self) -> Option<TransferProgress> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around an initialized relay.
    pub fn new(config: RelayConfig, relay: Arc<Relay>) -> Self {
        let state = AppState {
            relay,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/balance/{address}", get(handlers::balance))
            .route("/receive", post(handlers::receive))
            .route("/deposit-address/{deposit_id}", get(handlers::deposit_address))
            .route("/zero-balance-address", post(handlers::zero_balance_address))
            .route("/send", post(handlers::send))
            .route("/sweep", post(handlers::sweep))
            .route("/tx-status/{tx_hash}", get(handlers::tx_status))
            .route("/transfers/{address}", get(handlers::transfers))
            .route_layer(middleware::from_fn_with_state(state.clone(), track_request))
            .with_state(state)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        let request_id = request
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(request_id)),
            )
    }

    /// The router, for serving it some other way (tests drive it directly).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Bound every request by the configured timeout and record its outcome.
///
/// A timed-out handler is dropped; a broadcast it already sent may still be
/// mined. For transfers the 504 carries the correlation id and whatever
/// nonce and hash were already committed, so the caller can reconcile.
async fn track_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let operation = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched")
        .to_string();

    let slot = TransferSlot::default();
    request.extensions_mut().insert(slot.clone());

    let response = match tokio::time::timeout(state.request_timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                operation = %operation,
                timeout = ?state.request_timeout,
                "Request timed out"
            );
            timeout_error(state.request_timeout.as_secs(), slot.get()).into_response()
        }
    };

    metrics::record_request(&operation, response.status().as_u16(), start_time);
    response
}

fn timeout_error(seconds: u64, progress: Option<TransferProgress>) -> ApiError {
    let Some(progress) = progress else {
        return ApiError::new(RelayError::RequestTimeout {
            seconds,
            nonce: None,
            tx_hash: None,
        });
    };

    let committed = progress.committed();
    tracing::warn!(
        request_id = progress.request_id(),
        nonce = ?committed.nonce,
        tx_hash = ?committed.tx_hash,
        "Transfer timed out; outcome unknown"
    );
    ApiError::new(RelayError::RequestTimeout {
        seconds,
        nonce: committed.nonce,
        tx_hash: committed.tx_hash,
    })
    .with_request_id(progress.request_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::TxHash;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_timeout_without_transfer() {
        let response = timeout_error(30, None).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let json = body_json(response).await;
        assert_eq!(json["errorType"], "timeout");
        assert!(json.get("requestId").is_none());
        assert!(json.get("nonce").is_none());
    }

    #[tokio::test]
    async fn test_timeout_reports_committed_transfer() {
        let slot = TransferSlot::default();
        let progress = TransferProgress::new("req_slow");
        slot.attach(progress.clone());
        progress.record_nonce(7);
        progress.record_tx_hash(TxHash::repeat_byte(0x33));

        let response = timeout_error(1, slot.get()).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let json = body_json(response).await;
        assert_eq!(json["errorType"], "timeout");
        assert_eq!(json["requestId"], "req_slow");
        assert_eq!(json["nonce"], 7);
        assert_eq!(json["txHash"], TxHash::repeat_byte(0x33).to_string());
    }
}
