use crate::models::{CompletePaymentStatus, PurchaseSnapshot};
use crate::services::metrics::STATUS_COMPUTATIONS_TOTAL;
use crate::services::PaymentStatusCalculator;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

/// Derive the status of a purchase supplied in full by the caller.
#[tracing::instrument(skip(snapshot), fields(purchase_id = %snapshot.purchase_id()))]
pub async fn compute_payment_status(
    Json(snapshot): Json<PurchaseSnapshot>,
) -> Result<Json<CompletePaymentStatus>, AppError> {
    let status = PaymentStatusCalculator::compute_for_snapshot(&snapshot)?;
    STATUS_COMPUTATIONS_TOTAL
        .with_label_values(&[status.display_status.label()])
        .inc();
    Ok(Json(status))
}

/// Status of a stored purchase, served from the request cache when fresh.
#[tracing::instrument(skip(state))]
pub async fn get_payment_status(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> Result<Json<CompletePaymentStatus>, AppError> {
    let status = state.status.status_for(purchase_id).await?;
    Ok(Json(status))
}
