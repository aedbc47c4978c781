use axum::{Json, extract::State};
use shared::models::{Order, PaymentCallback};

use crate::core::ServerState;
use crate::utils::AppResult;

pub async fn callback(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentCallback>,
) -> AppResult<Json<Order>> {
    tracing::info!(
        order_id = payload.order_id,
        provider = %payload.provider,
        status = %payload.status,
        "Payment callback received"
    );
    let order = state.orders.payment_callback(&payload).await?;
    Ok(Json(order))
}
