use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{LoyaltyPoints, LoyaltySummary, LoyaltyTier};

use crate::auth::{AccessPolicy, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::loyalty;
use crate::utils::AppResult;

/// Ledger entries returned with the balance
const RECENT_TRANSACTIONS: i64 = 20;

pub async fn summary(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(customer_id): Path<i64>,
) -> AppResult<Json<LoyaltySummary>> {
    if user.is_customer() {
        AccessPolicy::check_owner(&user, Some(customer_id))?;
    } else {
        AccessPolicy::require_operator(&user)?;
    }

    // no row yet: nothing earned
    let points = loyalty::find_points(&state.pool, customer_id)
        .await?
        .unwrap_or(LoyaltyPoints {
            customer_id,
            points_balance: 0,
            lifetime_earned: 0,
            lifetime_redeemed: 0,
            tier: LoyaltyTier::for_lifetime_points(0),
            updated_at: 0,
        });
    let recent_transactions =
        loyalty::find_transactions(&state.pool, customer_id, RECENT_TRANSACTIONS).await?;

    Ok(Json(LoyaltySummary {
        points,
        recent_transactions,
    }))
}
