//! Rider API
//!
//! | Path | Method | Who |
//! |------|--------|-----|
//! | /api/riders | POST | manager / admin |
//! | /api/riders/available/{branch_id} | GET | branch staff |
//! | /api/riders/{id}/status | PATCH | branch staff, the rider |
//! | /api/riders/{id}/location | PATCH | branch staff, the rider |
//! | /api/riders/{id}/locations | GET | branch staff, the rider |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/riders", post(handler::register))
        .route("/api/riders/available/{branch_id}", get(handler::available))
        .route("/api/riders/{id}/status", patch(handler::update_status))
        .route("/api/riders/{id}/location", patch(handler::update_location))
        .route("/api/riders/{id}/locations", get(handler::locations))
}
