//! Inventory bookkeeping
//!
//! Stock is the running sum of signed transactions. Sales are written by
//! the side-effect worker, one row per order line; restock, wastage and
//! adjustments are entered by staff.

use shared::models::{InventoryTransaction, InventoryTransactionCreate, InventoryTransactionType};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, RepoResult, inventory, menu_item, order};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_QUANTITY, validate_optional_text};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Write one negative `sale` row per resolvable order line.
///
/// Lines whose menu item no longer exists, or whose insert fails, are
/// logged and skipped. Returns the number of rows written.
pub async fn deduct(pool: &SqlitePool, order_id: i64) -> RepoResult<usize> {
    let order = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("order {order_id}")))?;

    let now = now_millis();
    let mut recorded = 0;
    for item in &order.items {
        match menu_item::find_by_id(pool, item.menu_item_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(
                    order_id,
                    line_no = item.line_no,
                    menu_item_id = item.menu_item_id,
                    "Menu item not found, skipping stock deduction"
                );
                continue;
            }
            Err(e) => {
                tracing::warn!(order_id, line_no = item.line_no, error = %e, "Menu item lookup failed, skipping");
                continue;
            }
        }

        let entry = InventoryTransaction {
            id: snowflake_id(),
            branch_id: order.branch_id,
            menu_item_id: item.menu_item_id,
            quantity: -item.quantity,
            transaction_type: InventoryTransactionType::Sale,
            order_id: Some(order_id),
            line_no: Some(item.line_no),
            actor_id: None,
            notes: None,
            created_at: now,
        };
        match inventory::insert(pool, &entry).await {
            Ok(true) => recorded += 1,
            Ok(false) => {
                tracing::debug!(order_id, line_no = item.line_no, "Line already deducted");
            }
            Err(e) => {
                tracing::warn!(order_id, line_no = item.line_no, error = %e, "Stock deduction failed, skipping line");
            }
        }
    }

    tracing::debug!(order_id, recorded, lines = order.items.len(), "Inventory deducted");
    Ok(recorded)
}

/// Record a staff-entered stock movement.
///
/// Restock is stored positive and wastage negative whatever sign the caller
/// sends; adjustments keep their sign. Sales only come from orders.
pub async fn record_manual(
    pool: &SqlitePool,
    input: &InventoryTransactionCreate,
    actor_id: i64,
) -> AppResult<InventoryTransaction> {
    if input.quantity == 0 || input.quantity.unsigned_abs() > MAX_QUANTITY as u64 {
        return Err(AppError::validation(format!(
            "quantity must be non-zero and at most {MAX_QUANTITY} in magnitude, got {}",
            input.quantity
        ))
        .with_detail("field", "quantity"));
    }
    validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
    let quantity = match input.transaction_type {
        InventoryTransactionType::Restock => input.quantity.abs(),
        InventoryTransactionType::Wastage => -input.quantity.abs(),
        InventoryTransactionType::Adjustment => input.quantity,
        InventoryTransactionType::Sale => {
            return Err(AppError::validation(
                "sale transactions are recorded from orders, not entered manually",
            )
            .with_detail("field", "transaction_type"));
        }
    };
    menu_item::find_by_id(pool, input.menu_item_id)
        .await?
        .ok_or_else(|| AppError::entity_not_found(ErrorCode::MenuItemNotFound, input.menu_item_id))?;

    let entry = InventoryTransaction {
        id: snowflake_id(),
        branch_id: input.branch_id,
        menu_item_id: input.menu_item_id,
        quantity,
        transaction_type: input.transaction_type,
        order_id: None,
        line_no: None,
        actor_id: Some(actor_id),
        notes: input.notes.clone(),
        created_at: now_millis(),
    };
    inventory::insert(pool, &entry).await?;
    tracing::info!(
        branch_id = entry.branch_id,
        menu_item_id = entry.menu_item_id,
        quantity,
        kind = %entry.transaction_type,
        actor_id,
        "Inventory transaction recorded"
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn entry(kind: InventoryTransactionType, quantity: i64) -> InventoryTransactionCreate {
        InventoryTransactionCreate {
            branch_id: 1,
            menu_item_id: 10,
            quantity,
            transaction_type: kind,
            notes: None,
        }
    }

    #[tokio::test]
    async fn manual_entries_normalize_sign() {
        let pool = test_support::pool().await;
        test_support::seed_branch(&pool, 1, None).await;
        test_support::seed_menu_item(&pool, 10, 5.0).await;

        record_manual(&pool, &entry(InventoryTransactionType::Restock, -20), 7).await.unwrap();
        record_manual(&pool, &entry(InventoryTransactionType::Wastage, 3), 7).await.unwrap();
        record_manual(&pool, &entry(InventoryTransactionType::Adjustment, -2), 7).await.unwrap();

        assert_eq!(inventory::stock_level(&pool, 1, 10).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn manual_sale_and_zero_are_rejected() {
        let pool = test_support::pool().await;
        test_support::seed_menu_item(&pool, 10, 5.0).await;
        let err = record_manual(&pool, &entry(InventoryTransactionType::Sale, -1), 7)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let err = record_manual(&pool, &entry(InventoryTransactionType::Restock, 0), 7)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn unknown_menu_item_is_not_found() {
        let pool = test_support::pool().await;
        let err = record_manual(&pool, &entry(InventoryTransactionType::Restock, 1), 7)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemNotFound);
    }
}
