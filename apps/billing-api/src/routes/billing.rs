//! Sale endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopdesk_core::{Sale, SaleRequest};
use tracing::debug;

use crate::caller::Caller;
use crate::error::{ApiError, ErrorCode};
use crate::services::sale_service::RecordedSale;
use crate::AppState;

/// Body of a status change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Malformed JSON gets the same error body as a failed validation.
fn bad_body(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection.body_text(), "Rejected request body");
    ApiError::new(ErrorCode::ValidationError, "Malformed request body")
        .with_error(None, rejection.body_text())
}

/// `POST /billing/record-sale`
pub async fn record_sale(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedSale>), ApiError> {
    let Json(request) = body.map_err(bad_body)?;

    let recorded = state.sales.record_sale(caller.staff(), &request).await?;

    Ok((StatusCode::CREATED, Json(recorded)))
}

/// `GET /billing/invoices/{invoice_number}`
pub async fn get_invoice(
    State(state): State<AppState>,
    _caller: Caller,
    Path(invoice_number): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let sale = state.sales.get_invoice(&invoice_number).await?;
    Ok(Json(sale))
}

/// `PATCH /billing/invoices/{invoice_number}/status`
pub async fn change_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(invoice_number): Path<String>,
    body: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Result<Json<Sale>, ApiError> {
    let Json(request) = body.map_err(bad_body)?;

    let sale = state
        .sales
        .change_status(
            caller.staff(),
            &invoice_number,
            &request.status,
            request.reason.as_deref(),
        )
        .await?;

    Ok(Json(sale))
}
