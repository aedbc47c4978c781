//! Delivery Charges Config Repository

use super::RepoResult;
use shared::models::DeliveryChargesConfig;
use sqlx::SqlitePool;

pub async fn find_by_branch(
    pool: &SqlitePool,
    branch_id: i64,
) -> RepoResult<Option<DeliveryChargesConfig>> {
    let config = sqlx::query_as::<_, DeliveryChargesConfig>(
        "SELECT id, branch_id, charge_type, static_charge, base_charge, per_km_charge, free_delivery_threshold, max_delivery_distance, is_active, updated_at FROM delivery_charges_config WHERE branch_id = ?",
    )
    .bind(branch_id)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

/// Insert or replace the config of a branch (admin-managed)
pub async fn upsert(pool: &SqlitePool, config: &DeliveryChargesConfig) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO delivery_charges_config (id, branch_id, charge_type, static_charge, base_charge, per_km_charge, free_delivery_threshold, max_delivery_distance, is_active, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
         ON CONFLICT(branch_id) DO UPDATE SET charge_type = excluded.charge_type, static_charge = excluded.static_charge, base_charge = excluded.base_charge, per_km_charge = excluded.per_km_charge, free_delivery_threshold = excluded.free_delivery_threshold, max_delivery_distance = excluded.max_delivery_distance, is_active = excluded.is_active, updated_at = excluded.updated_at",
    )
    .bind(config.id)
    .bind(config.branch_id)
    .bind(config.charge_type.as_str())
    .bind(config.static_charge)
    .bind(config.base_charge)
    .bind(config.per_km_charge)
    .bind(config.free_delivery_threshold)
    .bind(config.max_delivery_distance)
    .bind(config.is_active)
    .bind(config.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}
