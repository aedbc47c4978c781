//! Real-time channel
//!
//! GET /ws?token=<JWT>
//!
//! Browsers cannot set headers on a WebSocket handshake, so the token
//! travels in the query string. After upgrade the server sends
//! `connection.ready` with the resolved scopes, then pushes every event
//! published to one of them. Client text frames are ignored.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handler::upgrade))
}
