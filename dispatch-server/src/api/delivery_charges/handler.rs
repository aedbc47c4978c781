use axum::{Json, extract::State};
use shared::models::{DeliveryChargeQuote, DeliveryChargeRequest};

use crate::auth::{AccessPolicy, CurrentUser};
use crate::core::ServerState;
use crate::utils::AppResult;

/// Any authenticated caller may quote, within their branch scope
pub async fn calculate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<DeliveryChargeRequest>,
) -> AppResult<Json<DeliveryChargeQuote>> {
    AccessPolicy::check_branch(&user, payload.branch_id)?;
    let quote = state.pricing.compute_delivery_charge(&payload).await?;
    Ok(Json(quote))
}
