//! Utilities: logging setup, input validation, money arithmetic
//!
//! Error types are re-exported from `shared::error` so handlers and
//! components import everything from one place.

pub mod logger;
pub mod money;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
