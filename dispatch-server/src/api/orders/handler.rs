//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    DiscountApply, KitchenTicket, Order, OrderCreate, OrderStatusUpdate, PaymentRecord,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    let order = state.orders.create(&user, payload).await?;
    Ok(Json(order))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get(&user, id).await?))
}

pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let order = state.orders.transition_status(&user, id, &payload.status).await?;
    Ok(Json(order))
}

pub async fn apply_discount(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<DiscountApply>,
) -> AppResult<Json<Order>> {
    let order = state.orders.apply_discount(&user, id, &payload).await?;
    Ok(Json(order))
}

pub async fn record_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentRecord>,
) -> AppResult<Json<Order>> {
    let order = state.orders.record_payment(&user, id, &payload).await?;
    Ok(Json(order))
}

pub async fn kitchen_tickets(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<KitchenTicket>>> {
    Ok(Json(state.kitchen.for_order(&user, id).await?))
}
