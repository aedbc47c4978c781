//! POS API: cash-drawer sessions and the kitchen queue

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/pos", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/sessions", post(handler::open_session))
        .route("/sessions/{id}/close", post(handler::close_session))
        .route("/sessions/active/{branch_id}", get(handler::active_session))
        .route(
            "/kitchen-tickets",
            post(handler::create_ticket).get(handler::list_tickets),
        )
        .route("/kitchen-tickets/{id}", put(handler::update_ticket))
}
