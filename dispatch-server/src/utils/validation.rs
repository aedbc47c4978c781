//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: rider name, terminal id
pub const MAX_NAME_LEN: usize = 200;

/// Notes, reasons (discount reason, cancel reason, session notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, vehicle number, transaction ids
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Delivery addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Maximum quantity per order line
pub const MAX_QUANTITY: i64 = 9999;

/// Maximum lines per order
pub const MAX_ORDER_LINES: usize = 200;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate latitude/longitude ranges
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation(format!(
            "latitude must be between -90 and 90, got {latitude}"
        ))
        .with_detail("field", "latitude"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation(format!(
            "longitude must be between -180 and 180, got {longitude}"
        ))
        .with_detail("field", "longitude"));
    }
    Ok(())
}
