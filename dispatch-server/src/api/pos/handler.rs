//! POS API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    KitchenTicket, KitchenTicketCreate, KitchenTicketUpdate, PosSession, PosSessionClose,
    PosSessionOpen,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub branch_id: Option<i64>,
}

pub async fn open_session(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PosSessionOpen>,
) -> AppResult<Json<PosSession>> {
    Ok(Json(state.pos.open(&user, &payload).await?))
}

pub async fn close_session(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PosSessionClose>,
) -> AppResult<Json<PosSession>> {
    Ok(Json(state.pos.close(&user, id, &payload).await?))
}

/// `null` when the branch has no open session
pub async fn active_session(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(branch_id): Path<i64>,
) -> AppResult<Json<Option<PosSession>>> {
    Ok(Json(state.pos.get_active(&user, branch_id).await?))
}

pub async fn create_ticket(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<KitchenTicketCreate>,
) -> AppResult<Json<KitchenTicket>> {
    Ok(Json(state.kitchen.create(&user, &payload).await?))
}

pub async fn update_ticket(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<KitchenTicketUpdate>,
) -> AppResult<Json<KitchenTicket>> {
    Ok(Json(state.kitchen.update_status(&user, id, &payload.status).await?))
}

pub async fn list_tickets(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<TicketQuery>,
) -> AppResult<Json<Vec<KitchenTicket>>> {
    Ok(Json(state.kitchen.list_open(&user, query.branch_id).await?))
}
