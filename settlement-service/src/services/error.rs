use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::RefundStatus;

/// Errors raised by the external settlement store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Store rejected write: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot move refund from {from} to {to}")]
    InvalidTransition { from: RefundStatus, to: RefundStatus },

    #[error("Return {0} is not eligible for automatic refund")]
    NotEligible(Uuid),

    #[error("Return {0} not found")]
    ReturnNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::InvalidInput(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            e @ SettlementError::InvalidTransition { .. } => {
                AppError::Conflict(anyhow::anyhow!(e.to_string()))
            }
            e @ SettlementError::NotEligible(_) => {
                AppError::Unprocessable(anyhow::anyhow!(e.to_string()))
            }
            e @ SettlementError::ReturnNotFound(_) => {
                AppError::NotFound(anyhow::anyhow!(e.to_string()))
            }
            SettlementError::Store(StoreError::NotFound(msg)) => {
                AppError::NotFound(anyhow::anyhow!(msg))
            }
            SettlementError::Store(StoreError::Conflict(msg)) => {
                AppError::Conflict(anyhow::anyhow!(msg))
            }
            SettlementError::Store(e) => AppError::BadGateway(e.to_string()),
        }
    }
}
