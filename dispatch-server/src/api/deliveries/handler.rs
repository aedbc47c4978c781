use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Delivery, DeliveryAssign, DeliveryStatusUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

pub async fn assign(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<DeliveryAssign>,
) -> AppResult<Json<Delivery>> {
    Ok(Json(state.dispatcher.assign(&user, &payload).await?))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Delivery>> {
    Ok(Json(state.dispatcher.get(&user, id).await?))
}

pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<DeliveryStatusUpdate>,
) -> AppResult<Json<Delivery>> {
    Ok(Json(state.dispatcher.update_status(&user, id, &payload).await?))
}
