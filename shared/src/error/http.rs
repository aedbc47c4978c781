//! HTTP status for each error code

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        use ErrorCode::*;

        match self {
            Success => StatusCode::OK,

            NotFound | BranchNotFound | MenuItemNotFound | OrderNotFound | SessionNotFound
            | TicketNotFound | RiderNotFound | DeliveryNotFound => StatusCode::NOT_FOUND,

            // State moved underneath the caller; re-read and retry
            AlreadyExists
            | InvalidStatusTransition
            | SessionAlreadyOpen
            | SessionAlreadyClosed
            | InvalidTicketTransition
            | RiderUnavailable
            | RiderBusy
            | DeliveryAlreadyAssigned
            | InvalidDeliveryTransition => StatusCode::CONFLICT,

            DeliveryOutOfRange => StatusCode::UNPROCESSABLE_ENTITY,

            NotAuthenticated | TokenExpired | TokenInvalid => StatusCode::UNAUTHORIZED,

            PermissionDenied | BranchScopeDenied => StatusCode::FORBIDDEN,

            Unknown | InternalError | DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            ValidationFailed | RequiredField | MenuItemUnavailable | OrderEmpty
            | InvalidDiscount | InvalidStatusValue | InvalidPaymentTransition | InvalidAmount => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
