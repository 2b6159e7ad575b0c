use crate::models::{Payment, RefundTransaction};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Body of `POST /refunds/preview`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefundPreviewRequest {
    #[validate(custom(function = "positive_amount"))]
    pub return_amount: Decimal,
    #[validate(length(max = 500, message = "Too many payments in one request"))]
    pub payments: Vec<Payment>,
    /// Refunds already drawn from these payments.
    #[serde(default)]
    pub prior_refunds: Vec<RefundTransaction>,
}

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive_amount");
        err.message = Some("Return amount must be greater than zero".into());
        Err(err)
    }
}
