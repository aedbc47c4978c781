//! Rider API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Rider, RiderCreate, RiderLocation, RiderLocationUpdate, RiderStatusUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// Trail window; `since` is epoch millis
#[derive(Debug, Deserialize)]
pub struct TrailQuery {
    pub since: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn register(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RiderCreate>,
) -> AppResult<Json<Rider>> {
    Ok(Json(state.dispatcher.register(&user, &payload).await?))
}

pub async fn available(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(branch_id): Path<i64>,
) -> AppResult<Json<Vec<Rider>>> {
    Ok(Json(state.dispatcher.get_available(&user, branch_id).await?))
}

pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RiderStatusUpdate>,
) -> AppResult<Json<Rider>> {
    Ok(Json(state.dispatcher.set_status(&user, id, &payload.status).await?))
}

pub async fn update_location(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RiderLocationUpdate>,
) -> AppResult<Json<RiderLocation>> {
    Ok(Json(state.dispatcher.record_location(&user, id, &payload).await?))
}

pub async fn locations(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<TrailQuery>,
) -> AppResult<Json<Vec<RiderLocation>>> {
    let trail = state
        .dispatcher
        .location_trail(&user, id, query.since, query.limit)
        .await?;
    Ok(Json(trail))
}
