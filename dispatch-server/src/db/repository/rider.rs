//! Rider Repository
//!
//! Availability is only flipped through the conditional updates below so the
//! "one active delivery per rider" rule holds under concurrent dispatch.

use super::{RepoError, RepoResult};
use shared::models::{Rider, RiderLocation, RiderStatus};
use sqlx::{SqliteConnection, SqlitePool};

const RIDER_COLUMNS: &str = "id, branch_id, user_id, name, phone, vehicle_type, vehicle_number, is_active, is_available, status, latitude, longitude, last_location_at, total_deliveries, created_at, updated_at";

pub async fn insert(pool: &SqlitePool, rider: &Rider) -> RepoResult<Rider> {
    sqlx::query(&format!(
        "INSERT INTO rider ({RIDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
    ))
    .bind(rider.id)
    .bind(rider.branch_id)
    .bind(rider.user_id)
    .bind(&rider.name)
    .bind(&rider.phone)
    .bind(&rider.vehicle_type)
    .bind(&rider.vehicle_number)
    .bind(rider.is_active)
    .bind(rider.is_available)
    .bind(rider.status.as_str())
    .bind(rider.latitude)
    .bind(rider.longitude)
    .bind(rider.last_location_at)
    .bind(rider.total_deliveries)
    .bind(rider.created_at)
    .bind(rider.updated_at)
    .execute(pool)
    .await?;

    find_by_id(pool, rider.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create rider".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Rider>> {
    let rider = sqlx::query_as::<_, Rider>(&format!("SELECT {RIDER_COLUMNS} FROM rider WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(rider)
}

/// Active riders of a branch that can take a delivery now
pub async fn find_available(pool: &SqlitePool, branch_id: i64) -> RepoResult<Vec<Rider>> {
    let riders = sqlx::query_as::<_, Rider>(&format!(
        "SELECT {RIDER_COLUMNS} FROM rider WHERE branch_id = ? AND is_active = 1 AND is_available = 1 ORDER BY total_deliveries, name"
    ))
    .bind(branch_id)
    .fetch_all(pool)
    .await?;
    Ok(riders)
}

/// Staff toggle between online / offline / on_break.
///
/// Never touches a busy rider; false when the rider is busy or missing.
pub async fn set_duty_status(
    pool: &SqlitePool,
    id: i64,
    status: RiderStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE rider SET status = ?1, is_available = ?2, updated_at = ?3 WHERE id = ?4 AND status <> 'busy'",
    )
    .bind(status.as_str())
    .bind(status == RiderStatus::Online)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Take an available rider for a delivery; false when someone else won
pub async fn claim(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE rider SET is_available = 0, status = 'busy', updated_at = ?1 WHERE id = ?2 AND is_active = 1 AND is_available = 1",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Put a rider back online after a delivery ends
pub async fn release(
    conn: &mut SqliteConnection,
    id: i64,
    completed_delivery: bool,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE rider SET is_available = 1, status = 'online', total_deliveries = total_deliveries + ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(i64::from(completed_delivery))
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Update live coordinates; false when the rider is missing
pub async fn update_position(
    pool: &SqlitePool,
    id: i64,
    latitude: f64,
    longitude: f64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE rider SET latitude = ?1, longitude = ?2, last_location_at = ?3, updated_at = ?3 WHERE id = ?4",
    )
    .bind(latitude)
    .bind(longitude)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Append to the location history
pub async fn insert_location(pool: &SqlitePool, location: &RiderLocation) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO rider_location (id, rider_id, delivery_id, latitude, longitude, accuracy, speed, heading, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(location.id)
    .bind(location.rider_id)
    .bind(location.delivery_id)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.accuracy)
    .bind(location.speed)
    .bind(location.heading)
    .bind(location.recorded_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Location trail, oldest first
pub async fn find_locations(
    pool: &SqlitePool,
    rider_id: i64,
    since: Option<i64>,
    limit: i64,
) -> RepoResult<Vec<RiderLocation>> {
    let locations = sqlx::query_as::<_, RiderLocation>(
        "SELECT id, rider_id, delivery_id, latitude, longitude, accuracy, speed, heading, recorded_at FROM ( \
           SELECT * FROM rider_location WHERE rider_id = ?1 AND recorded_at >= ?2 ORDER BY recorded_at DESC, id DESC LIMIT ?3 \
         ) ORDER BY recorded_at, id",
    )
    .bind(rider_id)
    .bind(since.unwrap_or(0))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(locations)
}
