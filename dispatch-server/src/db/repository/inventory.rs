//! Inventory Repository
//!
//! Stock is never stored; it is the sum of all transactions.

use super::RepoResult;
use shared::models::InventoryTransaction;
use sqlx::SqlitePool;

/// Append a transaction; false when this order line was already deducted
pub async fn insert(pool: &SqlitePool, transaction: &InventoryTransaction) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO inventory_transaction (id, branch_id, menu_item_id, quantity, transaction_type, order_id, line_no, actor_id, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
         ON CONFLICT DO NOTHING",
    )
    .bind(transaction.id)
    .bind(transaction.branch_id)
    .bind(transaction.menu_item_id)
    .bind(transaction.quantity)
    .bind(transaction.transaction_type.as_str())
    .bind(transaction.order_id)
    .bind(transaction.line_no)
    .bind(transaction.actor_id)
    .bind(&transaction.notes)
    .bind(transaction.created_at)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn stock_level(pool: &SqlitePool, branch_id: i64, menu_item_id: i64) -> RepoResult<i64> {
    let quantity: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM inventory_transaction WHERE branch_id = ? AND menu_item_id = ?",
    )
    .bind(branch_id)
    .bind(menu_item_id)
    .fetch_one(pool)
    .await?;
    Ok(quantity)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<InventoryTransaction>> {
    let transactions = sqlx::query_as::<_, InventoryTransaction>(
        "SELECT id, branch_id, menu_item_id, quantity, transaction_type, order_id, line_no, actor_id, notes, created_at FROM inventory_transaction WHERE order_id = ? ORDER BY line_no",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(transactions)
}
