//! Side-effect outbox repository
//!
//! Jobs are written in the same transaction as the order they belong to and
//! consumed by the side-effect worker.

use super::RepoResult;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// Kind of deferred bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SideEffectKind {
    LoyaltyAccrual,
    InventoryDeduction,
}

impl SideEffectKind {
    pub const ALL: [SideEffectKind; 2] = [Self::LoyaltyAccrual, Self::InventoryDeduction];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LoyaltyAccrual => "loyalty_accrual",
            Self::InventoryDeduction => "inventory_deduction",
        }
    }
}

/// Outbox row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SideEffectJob {
    pub id: i64,
    pub order_id: i64,
    pub kind: SideEffectKind,
    pub status: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub next_attempt_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Record one pending job of `kind` for an order
pub async fn enqueue(
    conn: &mut SqliteConnection,
    id: i64,
    order_id: i64,
    kind: SideEffectKind,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO side_effect_job (id, order_id, kind, status, attempts, next_attempt_at, created_at, updated_at) VALUES (?1, ?2, ?3, 'pending', 0, ?4, ?4, ?4) \
         ON CONFLICT(order_id, kind) DO NOTHING",
    )
    .bind(id)
    .bind(order_id)
    .bind(kind.as_str())
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Pending jobs whose retry time has come, oldest first
pub async fn find_due(pool: &SqlitePool, now: i64, limit: i64) -> RepoResult<Vec<SideEffectJob>> {
    let jobs = sqlx::query_as::<_, SideEffectJob>(
        "SELECT id, order_id, kind, status, attempts, last_error, next_attempt_at, created_at, updated_at FROM side_effect_job \
         WHERE status = 'pending' AND next_attempt_at <= ? ORDER BY next_attempt_at, id LIMIT ?",
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(jobs)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<SideEffectJob>> {
    let jobs = sqlx::query_as::<_, SideEffectJob>(
        "SELECT id, order_id, kind, status, attempts, last_error, next_attempt_at, created_at, updated_at FROM side_effect_job WHERE order_id = ? ORDER BY kind",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(jobs)
}

pub async fn mark_done(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<()> {
    sqlx::query(
        "UPDATE side_effect_job SET status = 'done', attempts = attempts + 1, last_error = NULL, updated_at = ?1 WHERE id = ?2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a failed attempt and schedule the next one
pub async fn mark_retry(
    pool: &SqlitePool,
    id: i64,
    error: &str,
    next_attempt_at: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE side_effect_job SET attempts = attempts + 1, last_error = ?1, next_attempt_at = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(error)
    .bind(next_attempt_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Give up on a job after the last allowed attempt
pub async fn mark_dead(pool: &SqlitePool, id: i64, error: &str, now: i64) -> RepoResult<()> {
    sqlx::query(
        "UPDATE side_effect_job SET status = 'dead', attempts = attempts + 1, last_error = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(error)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Make every pending job due now; returns how many were pending
pub async fn recover_pending(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE side_effect_job SET next_attempt_at = ?1 WHERE status = 'pending' AND next_attempt_at > ?1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    let pending: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM side_effect_job WHERE status = 'pending'")
            .fetch_one(pool)
            .await?;
    if rows.rows_affected() > 0 {
        tracing::debug!(rescheduled = rows.rows_affected(), "Pulled forward backed-off jobs");
    }
    Ok(pending as u64)
}
