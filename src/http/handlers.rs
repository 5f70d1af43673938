//! Route handlers. Each one parses its input, calls into the relay, and
//! renders the result as JSON.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::Json;

use crate::http::response::ApiError;
use crate::http::server::{AppState, TransferSlot};
use crate::relay::types::{
    resolve_request_id, AddressResponse, BalanceResponse, DepositAddressResponse, HealthReport,
    SendRequest, SweepRequest, TransferHistory, TransferReceipt, ZeroBalanceAddress,
    ZeroBalanceRequest,
};
use crate::relay::{RelayError, StatusReport, TransferProgress};

type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_json(rejection: JsonRejection) -> ApiError {
    RelayError::BadRequest(rejection.body_text()).into()
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.relay.health().await)
}

pub async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<BalanceResponse> {
    Ok(Json(state.relay.balance(&address).await?))
}

pub async fn receive(State(state): State<AppState>) -> Json<AddressResponse> {
    Json(state.relay.receive_address())
}

pub async fn deposit_address(
    State(state): State<AppState>,
    Path(deposit_id): Path<String>,
) -> ApiResult<DepositAddressResponse> {
    Ok(Json(state.relay.deposit_address(&deposit_id)?))
}

/// The body is optional; `deposit_id`, when present, is only logged.
pub async fn zero_balance_address(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<ZeroBalanceAddress> {
    let request: ZeroBalanceRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ZeroBalanceRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::from(RelayError::BadRequest(e.to_string())))?
    };

    let deposit_id = request.deposit_id.map(|id| id.to_string());
    Ok(Json(
        state
            .relay
            .zero_balance_address(deposit_id.as_deref())
            .await?,
    ))
}

pub async fn send(
    State(state): State<AppState>,
    Extension(slot): Extension<TransferSlot>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<TransferReceipt> {
    let Json(request) = payload.map_err(bad_json)?;
    let progress = TransferProgress::new(resolve_request_id(request.request_id.as_deref()));
    slot.attach(progress.clone());

    state
        .relay
        .send(&request, &progress)
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e).with_request_id(progress.request_id()))
}

pub async fn sweep(
    State(state): State<AppState>,
    Extension(slot): Extension<TransferSlot>,
    payload: Result<Json<SweepRequest>, JsonRejection>,
) -> ApiResult<TransferReceipt> {
    let Json(request) = payload.map_err(bad_json)?;
    let progress = TransferProgress::new(resolve_request_id(request.request_id.as_deref()));
    slot.attach(progress.clone());

    state
        .relay
        .sweep(&request, &progress)
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e).with_request_id(progress.request_id()))
}

pub async fn tx_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> ApiResult<StatusReport> {
    Ok(Json(state.relay.tx_status(&tx_hash).await?))
}

pub async fn transfers(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<TransferHistory> {
    Ok(Json(state.relay.recent_transfers(&address).await?))
}
