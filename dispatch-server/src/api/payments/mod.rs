//! Payment gateway callback
//!
//! Unauthenticated: the gateway posts the outcome of a wallet or card
//! payment and it goes through the same payment state machine as staff
//! entries.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/callback", post(handler::callback))
}
