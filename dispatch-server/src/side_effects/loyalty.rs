//! Loyalty accrual for completed checkouts

use rust_decimal::prelude::*;
use shared::models::{LoyaltyPoints, LoyaltyTransaction, LoyaltyTransactionType, OrderStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, RepoResult, loyalty, order};
use crate::utils::money::to_decimal;

/// Currency spent per point earned
pub const CURRENCY_PER_POINT: i64 = 100;

/// `floor(total / 100)`
pub fn points_for_total(total: f64) -> i64 {
    (to_decimal(total) / Decimal::from(CURRENCY_PER_POINT))
        .floor()
        .to_i64()
        .unwrap_or(0)
        .max(0)
}

/// Credit the order's customer; `None` when nothing was credited.
///
/// The ledger insert and the balance update share one transaction, and the
/// ledger is unique per order, so running twice credits once.
pub async fn accrue(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<LoyaltyPoints>> {
    let order = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("order {order_id}")))?;

    let Some(customer_id) = order.customer_id else {
        tracing::debug!(order_id, "Anonymous order, no loyalty accrual");
        return Ok(None);
    };
    if order.status == OrderStatus::Cancelled {
        tracing::debug!(order_id, "Order cancelled, no loyalty accrual");
        return Ok(None);
    }
    let points = points_for_total(order.total);
    if points == 0 {
        return Ok(None);
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let entry = LoyaltyTransaction {
        id: snowflake_id(),
        customer_id,
        order_id: Some(order_id),
        points,
        transaction_type: LoyaltyTransactionType::Earned,
        description: Some(format!("Order {order_id}")),
        created_at: now,
    };
    if !loyalty::insert_transaction(&mut *tx, &entry).await? {
        tracing::debug!(order_id, customer_id, "Loyalty already credited for order");
        return Ok(None);
    }
    let balance = loyalty::credit(&mut *tx, customer_id, points, now).await?;
    tx.commit().await?;

    tracing::info!(
        order_id,
        customer_id,
        points,
        balance = balance.points_balance,
        tier = %balance.tier,
        "Loyalty points credited"
    );
    Ok(Some(balance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_point_per_hundred() {
        assert_eq!(points_for_total(0.0), 0);
        assert_eq!(points_for_total(99.99), 0);
        assert_eq!(points_for_total(100.0), 1);
        assert_eq!(points_for_total(2599.5), 25);
    }
}
