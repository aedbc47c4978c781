//! Inventory API
//!
//! Stock is never stored; it is the sum of the branch's transactions for
//! an item.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/inventory/transactions", post(handler::record))
        .route(
            "/api/inventory/stock/{branch_id}/{menu_item_id}",
            get(handler::stock),
        )
}
