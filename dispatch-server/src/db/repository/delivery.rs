//! Delivery Repository

use super::{RepoError, RepoResult};
use shared::models::{Delivery, DeliveryStatus};
use sqlx::{SqliteConnection, SqlitePool};

const DELIVERY_COLUMNS: &str = "id, order_id, rider_id, branch_id, status, assigned_at, accepted_at, picked_up_at, delivered_at, cancelled_at, actual_duration_minutes, cancel_reason, notes, updated_at";

/// Insert a freshly assigned delivery.
///
/// A second live delivery for the same order violates
/// `idx_delivery_one_per_order` and comes back as `RepoError::Duplicate`.
pub async fn insert(conn: &mut SqliteConnection, delivery: &Delivery) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO delivery (id, order_id, rider_id, branch_id, status, assigned_at, notes, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?6)",
    )
    .bind(delivery.id)
    .bind(delivery.order_id)
    .bind(delivery.rider_id)
    .bind(delivery.branch_id)
    .bind(delivery.status.as_str())
    .bind(delivery.assigned_at)
    .bind(&delivery.notes)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Delivery>> {
    let delivery = sqlx::query_as::<_, Delivery>(&format!(
        "SELECT {DELIVERY_COLUMNS} FROM delivery WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(delivery)
}

/// The non-cancelled delivery of an order, if any
pub async fn find_live_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Delivery>> {
    let delivery = sqlx::query_as::<_, Delivery>(&format!(
        "SELECT {DELIVERY_COLUMNS} FROM delivery WHERE order_id = ? AND status <> 'cancelled' LIMIT 1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(delivery)
}

/// The in-flight delivery a rider is carrying, if any
pub async fn find_active_by_rider(pool: &SqlitePool, rider_id: i64) -> RepoResult<Option<Delivery>> {
    let delivery = sqlx::query_as::<_, Delivery>(&format!(
        "SELECT {DELIVERY_COLUMNS} FROM delivery WHERE rider_id = ? AND status IN ('assigned', 'accepted', 'picked_up') LIMIT 1"
    ))
    .bind(rider_id)
    .fetch_optional(pool)
    .await?;
    Ok(delivery)
}

/// Fields written by a status change
#[derive(Debug, Clone, Default)]
pub struct StatusStamp<'a> {
    pub actual_duration_minutes: Option<i64>,
    pub cancel_reason: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Move `from → to` and stamp the timestamp column of `to`.
///
/// Returns false when the delivery is no longer in `from`.
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    from: DeliveryStatus,
    to: DeliveryStatus,
    stamp: StatusStamp<'_>,
    now: i64,
) -> RepoResult<bool> {
    let column = match to {
        DeliveryStatus::Accepted => "accepted_at",
        DeliveryStatus::PickedUp => "picked_up_at",
        DeliveryStatus::Delivered => "delivered_at",
        DeliveryStatus::Cancelled => "cancelled_at",
        DeliveryStatus::Assigned => {
            return Err(RepoError::Validation(
                "a delivery cannot move back to assigned".into(),
            ));
        }
    };

    let rows = sqlx::query(&format!(
        "UPDATE delivery SET status = ?1, {column} = ?2, updated_at = ?2, \
         actual_duration_minutes = COALESCE(?3, actual_duration_minutes), \
         cancel_reason = COALESCE(?4, cancel_reason), notes = COALESCE(?5, notes) \
         WHERE id = ?6 AND status = ?7"
    ))
    .bind(to.as_str())
    .bind(now)
    .bind(stamp.actual_duration_minutes)
    .bind(stamp.cancel_reason)
    .bind(stamp.notes)
    .bind(id)
    .bind(from.as_str())
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}
