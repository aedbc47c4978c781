//! Loyalty Repository
//!
//! `loyalty_points` holds the authoritative balance; `loyalty_transaction`
//! is the append-only audit trail.

use super::RepoResult;
use shared::models::{LoyaltyPoints, LoyaltyTier, LoyaltyTransaction};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_points(pool: &SqlitePool, customer_id: i64) -> RepoResult<Option<LoyaltyPoints>> {
    let points = sqlx::query_as::<_, LoyaltyPoints>(
        "SELECT customer_id, points_balance, lifetime_earned, lifetime_redeemed, tier, updated_at FROM loyalty_points WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;
    Ok(points)
}

pub async fn find_transactions(
    pool: &SqlitePool,
    customer_id: i64,
    limit: i64,
) -> RepoResult<Vec<LoyaltyTransaction>> {
    let transactions = sqlx::query_as::<_, LoyaltyTransaction>(
        "SELECT id, customer_id, order_id, points, transaction_type, description, created_at FROM loyalty_transaction WHERE customer_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(customer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(transactions)
}

/// Append a ledger entry; false if this order was already credited
pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &LoyaltyTransaction,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO loyalty_transaction (id, customer_id, order_id, points, transaction_type, description, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT DO NOTHING",
    )
    .bind(transaction.id)
    .bind(transaction.customer_id)
    .bind(transaction.order_id)
    .bind(transaction.points)
    .bind(transaction.transaction_type.as_str())
    .bind(&transaction.description)
    .bind(transaction.created_at)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Add earned points and recompute the tier from the new lifetime total
pub async fn credit(
    conn: &mut SqliteConnection,
    customer_id: i64,
    points: i64,
    now: i64,
) -> RepoResult<LoyaltyPoints> {
    sqlx::query(
        "INSERT INTO loyalty_points (customer_id, points_balance, lifetime_earned, lifetime_redeemed, tier, updated_at) VALUES (?1, ?2, ?2, 0, 'bronze', ?3) \
         ON CONFLICT(customer_id) DO UPDATE SET points_balance = points_balance + excluded.points_balance, lifetime_earned = lifetime_earned + excluded.lifetime_earned, updated_at = excluded.updated_at",
    )
    .bind(customer_id)
    .bind(points)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let mut balance = sqlx::query_as::<_, LoyaltyPoints>(
        "SELECT customer_id, points_balance, lifetime_earned, lifetime_redeemed, tier, updated_at FROM loyalty_points WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await?;

    let tier = LoyaltyTier::for_lifetime_points(balance.lifetime_earned);
    if tier != balance.tier {
        sqlx::query("UPDATE loyalty_points SET tier = ?1 WHERE customer_id = ?2")
            .bind(tier.as_str())
            .bind(customer_id)
            .execute(&mut *conn)
            .await?;
        balance.tier = tier;
    }
    Ok(balance)
}
