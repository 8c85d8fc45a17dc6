pub mod admin;
pub mod auth;
pub mod cards;
pub mod health;
pub mod loans;
pub mod savings;
pub mod transactions;

use rust_decimal::Decimal;

use crate::error::{ApiError, Result};

/// Payload amounts must be strictly positive.
pub(crate) fn positive_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation("Invalid amount".to_string()));
    }
    Ok(amount)
}
