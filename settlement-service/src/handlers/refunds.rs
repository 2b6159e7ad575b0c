use crate::dtos::RefundPreviewRequest;
use crate::models::RefundAllocation;
use crate::services::metrics::record_allocation;
use crate::services::{RefundAllocator, RefundOutcome};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

/// Show how a refund would be split across payments without recording it.
#[tracing::instrument(skip(request), fields(return_amount = %request.return_amount))]
pub async fn preview_refund(
    Json(request): Json<RefundPreviewRequest>,
) -> Result<Json<RefundAllocation>, AppError> {
    request.validate()?;

    let allocation = RefundAllocator::allocate_after(
        request.return_amount,
        &request.payments,
        &request.prior_refunds,
    );
    record_allocation(&allocation);
    Ok(Json(allocation))
}

/// Run the automatic refund for a pending return.
#[tracing::instrument(skip(state))]
pub async fn process_refund(
    State(state): State<AppState>,
    Path(return_id): Path<Uuid>,
) -> Result<Json<RefundOutcome>, AppError> {
    let outcome = state.refunds.process(return_id).await?;
    Ok(Json(outcome))
}

/// Retry a refund that previously failed.
#[tracing::instrument(skip(state))]
pub async fn retry_refund(
    State(state): State<AppState>,
    Path(return_id): Path<Uuid>,
) -> Result<Json<RefundOutcome>, AppError> {
    let outcome = state.refunds.retry(return_id).await?;
    Ok(Json(outcome))
}
