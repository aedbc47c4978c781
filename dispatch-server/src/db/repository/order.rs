//! Order Repository
//!
//! Orders and their line items. Status and payment updates are conditional
//! on the state the caller read, so a concurrent change surfaces as
//! `rows_affected() == 0` instead of a lost update.

use super::RepoResult;
use serde_json::Value;
use shared::models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "id, branch_id, customer_id, order_type, source, subtotal, discount, discount_reason, delivery_charge, delivery_distance, delivery_address, total, payment_method, payment_status, payment_metadata, status, table_id, pos_session_id, notes, created_at, updated_at, completed_at";

/// Insert an order and all of its line items
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(&format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
    ))
    .bind(order.id)
    .bind(order.branch_id)
    .bind(order.customer_id)
    .bind(order.order_type.as_str())
    .bind(order.source.as_str())
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(&order.discount_reason)
    .bind(order.delivery_charge)
    .bind(order.delivery_distance)
    .bind(&order.delivery_address)
    .bind(order.total)
    .bind(order.payment_method.as_str())
    .bind(order.payment_status.as_str())
    .bind(order.payment_metadata.to_string())
    .bind(order.status.as_str())
    .bind(order.table_id)
    .bind(order.pos_session_id)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        let variants = serde_json::to_string(&item.variants)
            .map_err(|e| super::RepoError::Validation(e.to_string()))?;
        sqlx::query(
            "INSERT INTO order_item (id, order_id, line_no, menu_item_id, name, quantity, unit_price, variants, line_total, notes) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(item.id)
        .bind(order.id)
        .bind(item.line_no)
        .bind(item.menu_item_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(variants)
        .bind(item.line_total)
        .bind(&item.notes)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Fetch an order with its line items
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match order {
        Some(mut order) => {
            order.items = find_items(pool, id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, line_no, menu_item_id, name, quantity, unit_price, variants, line_total, notes FROM order_item WHERE order_id = ? ORDER BY line_no",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Set discount and total together; returns false if the order is gone
pub async fn update_discount(
    pool: &SqlitePool,
    id: i64,
    discount: f64,
    reason: Option<&str>,
    total: f64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET discount = ?1, discount_reason = ?2, total = ?3, updated_at = ?4 WHERE id = ?5",
    )
    .bind(discount)
    .bind(reason)
    .bind(total)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Move `from → to`; false when the order is no longer in `from`
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let completed_at = (to == OrderStatus::Completed).then_some(now);
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2, completed_at = COALESCE(?3, completed_at) WHERE id = ?4 AND status = ?5",
    )
    .bind(to.as_str())
    .bind(now)
    .bind(completed_at)
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Write payment fields; false when payment status moved since it was read
pub async fn update_payment(
    pool: &SqlitePool,
    id: i64,
    expected_status: PaymentStatus,
    method: PaymentMethod,
    status: PaymentStatus,
    metadata: &Value,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_method = ?1, payment_status = ?2, payment_metadata = ?3, updated_at = ?4 WHERE id = ?5 AND payment_status = ?6",
    )
    .bind(method.as_str())
    .bind(status.as_str())
    .bind(metadata.to_string())
    .bind(now)
    .bind(id)
    .bind(expected_status.as_str())
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
