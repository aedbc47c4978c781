//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done in `Decimal`, then converted back to `f64` for
//! storage/serialization, rounded to 2 places half-up.

use rust_decimal::prelude::*;

use crate::utils::{AppError, ErrorCode};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price / amount
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Convert f64 to Decimal (non-finite values become zero)
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64, rounded to 2 places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round an f64 amount to 2 places
#[inline]
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Validate that an amount is finite, non-negative and below [`MAX_AMOUNT`]
pub fn require_amount(value: f64, field: &str, code: ErrorCode) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::with_message(code, format!("{field} must be a finite number"))
            .with_detail("field", field));
    }
    if value < 0.0 {
        return Err(
            AppError::with_message(code, format!("{field} must be non-negative, got {value}"))
                .with_detail("field", field),
        );
    }
    if value > MAX_AMOUNT {
        return Err(AppError::with_message(
            code,
            format!("{field} exceeds maximum allowed ({MAX_AMOUNT}), got {value}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Line total: (unit price) × quantity
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Sum of line totals
pub fn sum_amounts(values: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(values.into_iter().map(to_decimal).sum())
}

/// `subtotal - discount + delivery_charge`
pub fn order_total(subtotal: f64, discount: f64, delivery_charge: f64) -> f64 {
    to_f64(to_decimal(subtotal) - to_decimal(discount) + to_decimal(delivery_charge))
}
