//! Order API
//!
//! All mutations go through `OrderLifecycle`; handlers only extract and
//! forward.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::create))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/orders/{id}/status", post(handler::update_status))
        .route("/api/orders/{id}/discount", post(handler::apply_discount))
        .route("/api/orders/{id}/payment", post(handler::record_payment))
        .route("/api/orders/{id}/kitchen-tickets", get(handler::kitchen_tickets))
}
