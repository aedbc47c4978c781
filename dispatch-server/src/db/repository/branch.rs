//! Branch Repository
//!
//! Branches are maintained by the catalogue service; this crate reads them
//! and upserts on sync.

use super::RepoResult;
use shared::models::Branch;
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Branch>> {
    let branch = sqlx::query_as::<_, Branch>(
        "SELECT id, name, address, latitude, longitude, is_active FROM branch WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(branch)
}

pub async fn upsert(pool: &SqlitePool, branch: &Branch) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO branch (id, name, address, latitude, longitude, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, address = excluded.address, latitude = excluded.latitude, longitude = excluded.longitude, is_active = excluded.is_active",
    )
    .bind(branch.id)
    .bind(&branch.name)
    .bind(&branch.address)
    .bind(branch.latitude)
    .bind(branch.longitude)
    .bind(branch.is_active)
    .execute(pool)
    .await?;
    Ok(())
}
