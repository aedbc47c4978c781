//! Error codes, grouped by leading digit:
//! - 0xxx General
//! - 1xxx Authentication
//! - 2xxx Permission / branch scope
//! - 3xxx Branch & menu catalogue
//! - 4xxx Order
//! - 5xxx Payment
//! - 6xxx POS session
//! - 7xxx Kitchen ticket
//! - 8xxx Rider & delivery
//! - 9xxx System

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error code sent to clients as `code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // 0xxx general
    Success = 0,
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    RequiredField = 7,

    // 1xxx auth
    NotAuthenticated = 1001,
    TokenExpired = 1003,
    TokenInvalid = 1004,

    // 2xxx permission
    PermissionDenied = 2001,
    /// Caller may not act on the requested branch
    BranchScopeDenied = 2006,

    // 3xxx branch
    BranchNotFound = 3001,
    MenuItemNotFound = 3002,
    /// Menu item is not available for ordering
    MenuItemUnavailable = 3003,

    // 4xxx order
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Discount is negative or exceeds the subtotal
    InvalidDiscount = 4010,
    /// Status value is not part of the order state machine
    InvalidStatusValue = 4011,
    /// Status change is not allowed from the current state
    InvalidStatusTransition = 4012,

    // 5xxx payment
    /// Payment status change rejected
    InvalidPaymentTransition = 5010,

    // 6xxx pos session
    SessionNotFound = 6001,
    /// A session is already open for the branch
    SessionAlreadyOpen = 6002,
    /// Session is already closed
    SessionAlreadyClosed = 6003,
    /// Cash amount is missing, negative or not a number
    InvalidAmount = 6004,

    // 7xxx kitchen
    TicketNotFound = 7001,
    /// Kitchen ticket status would regress
    InvalidTicketTransition = 7002,

    // 8xxx rider & delivery
    RiderNotFound = 8001,
    /// Rider is not available for assignment
    RiderUnavailable = 8002,
    /// Rider holds an active delivery
    RiderBusy = 8003,
    DeliveryNotFound = 8101,
    /// Order already has an active delivery
    DeliveryAlreadyAssigned = 8102,
    /// Delivery status would regress or leave a terminal state
    InvalidDeliveryTransition = 8103,
    /// Delivery address is beyond the branch's serviceable distance
    DeliveryOutOfRange = 8104,

    // 9xxx system
    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default English message
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::BranchScopeDenied => "Not allowed to act on this branch",

            // Branch
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::InvalidDiscount => "Discount must be between 0 and the order subtotal",
            ErrorCode::InvalidStatusValue => "Invalid order status",
            ErrorCode::InvalidStatusTransition => "Order status change is not allowed",

            // Payment
            ErrorCode::InvalidPaymentTransition => "Payment status change is not allowed",

            // POS
            ErrorCode::SessionNotFound => "POS session not found",
            ErrorCode::SessionAlreadyOpen => "A POS session is already open for this branch",
            ErrorCode::SessionAlreadyClosed => "POS session is already closed",
            ErrorCode::InvalidAmount => "Amount must be a non-negative number",

            // Kitchen
            ErrorCode::TicketNotFound => "Kitchen ticket not found",
            ErrorCode::InvalidTicketTransition => "Kitchen ticket status cannot go backwards",

            // Delivery
            ErrorCode::RiderNotFound => "Rider not found",
            ErrorCode::RiderUnavailable => "Rider is not available for assignment",
            ErrorCode::RiderBusy => "Rider has an active delivery",
            ErrorCode::DeliveryNotFound => "Delivery not found",
            ErrorCode::DeliveryAlreadyAssigned => "Order already has an active delivery",
            ErrorCode::InvalidDeliveryTransition => "Delivery status change is not allowed",
            ErrorCode::DeliveryOutOfRange => "Delivery address is outside the delivery range",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Number that does not name an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

/// Every defined code, in numeric order
pub const ALL_ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::Success,
    ErrorCode::Unknown,
    ErrorCode::ValidationFailed,
    ErrorCode::NotFound,
    ErrorCode::AlreadyExists,
    ErrorCode::RequiredField,
    ErrorCode::NotAuthenticated,
    ErrorCode::TokenExpired,
    ErrorCode::TokenInvalid,
    ErrorCode::PermissionDenied,
    ErrorCode::BranchScopeDenied,
    ErrorCode::BranchNotFound,
    ErrorCode::MenuItemNotFound,
    ErrorCode::MenuItemUnavailable,
    ErrorCode::OrderNotFound,
    ErrorCode::OrderEmpty,
    ErrorCode::InvalidDiscount,
    ErrorCode::InvalidStatusValue,
    ErrorCode::InvalidStatusTransition,
    ErrorCode::InvalidPaymentTransition,
    ErrorCode::SessionNotFound,
    ErrorCode::SessionAlreadyOpen,
    ErrorCode::SessionAlreadyClosed,
    ErrorCode::InvalidAmount,
    ErrorCode::TicketNotFound,
    ErrorCode::InvalidTicketTransition,
    ErrorCode::RiderNotFound,
    ErrorCode::RiderUnavailable,
    ErrorCode::RiderBusy,
    ErrorCode::DeliveryNotFound,
    ErrorCode::DeliveryAlreadyAssigned,
    ErrorCode::InvalidDeliveryTransition,
    ErrorCode::DeliveryOutOfRange,
    ErrorCode::InternalError,
    ErrorCode::DatabaseError,
];

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ALL_ERROR_CODES
            .iter()
            .copied()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::SessionAlreadyClosed.code(), 6003);
        assert_eq!(ErrorCode::RiderUnavailable.code(), 8002);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn table_is_sorted_and_unique() {
        assert!(ALL_ERROR_CODES.windows(2).all(|w| w[0].code() < w[1].code()));
        assert_eq!(ErrorCode::try_from(8102), Ok(ErrorCode::DeliveryAlreadyAssigned));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::RiderUnavailable).unwrap();
        assert_eq!(json, "8002");
        let code: ErrorCode = serde_json::from_str("6003").unwrap();
        assert_eq!(code, ErrorCode::SessionAlreadyClosed);
    }
}
