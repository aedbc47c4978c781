//! Loyalty balance
//!
//! Customers read their own balance; operators read any.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/loyalty/{customer_id}", get(handler::summary))
}
