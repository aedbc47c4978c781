use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{InventoryTransaction, InventoryTransactionCreate, StockLevel};

use crate::auth::permissions::INVENTORY_MANAGE;
use crate::auth::{AccessPolicy, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::inventory;
use crate::side_effects;
use crate::utils::AppResult;

pub async fn record(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<InventoryTransactionCreate>,
) -> AppResult<Json<InventoryTransaction>> {
    AccessPolicy::require_operator(&user)?;
    AccessPolicy::require_permission(&user, INVENTORY_MANAGE)?;
    AccessPolicy::check_branch(&user, payload.branch_id)?;
    let entry = side_effects::inventory::record_manual(&state.pool, &payload, user.id).await?;
    Ok(Json(entry))
}

pub async fn stock(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((branch_id, menu_item_id)): Path<(i64, i64)>,
) -> AppResult<Json<StockLevel>> {
    AccessPolicy::require_operator(&user)?;
    AccessPolicy::check_branch(&user, branch_id)?;
    let quantity = inventory::stock_level(&state.pool, branch_id, menu_item_id).await?;
    Ok(Json(StockLevel {
        branch_id,
        menu_item_id,
        quantity,
    }))
}
