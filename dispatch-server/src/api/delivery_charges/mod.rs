//! Delivery charge quotes
//!
//! Request and response use camelCase keys; money is a decimal string.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/delivery-charges/calculate", post(handler::calculate))
}
