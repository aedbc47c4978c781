//! POS Session Repository

use super::RepoResult;
use shared::models::PosSession;
use sqlx::SqlitePool;

const SESSION_COLUMNS: &str = "id, branch_id, terminal_id, session_number, status, opening_cash, closing_cash, opened_by, closed_by, notes, opened_at, closed_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PosSession>> {
    let session = sqlx::query_as::<_, PosSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM pos_session WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(session)
}

pub async fn find_open_by_branch(pool: &SqlitePool, branch_id: i64) -> RepoResult<Option<PosSession>> {
    let session = sqlx::query_as::<_, PosSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM pos_session WHERE branch_id = ? AND status = 'open' LIMIT 1"
    ))
    .bind(branch_id)
    .fetch_optional(pool)
    .await?;
    Ok(session)
}

/// Insert an open session with the next session number of the branch.
///
/// The partial unique index on open sessions turns a second concurrent
/// open into `RepoError::Duplicate`.
pub async fn insert_open(
    pool: &SqlitePool,
    id: i64,
    branch_id: i64,
    terminal_id: &str,
    opening_cash: f64,
    opened_by: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO pos_session (id, branch_id, terminal_id, session_number, status, opening_cash, opened_by, opened_at) \
         SELECT ?1, ?2, ?3, COALESCE(MAX(session_number), 0) + 1, 'open', ?4, ?5, ?6 FROM pos_session WHERE branch_id = ?2",
    )
    .bind(id)
    .bind(branch_id)
    .bind(terminal_id)
    .bind(opening_cash)
    .bind(opened_by)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Close an open session; false when it is not open (missing or closed)
pub async fn close(
    pool: &SqlitePool,
    id: i64,
    closing_cash: f64,
    notes: Option<&str>,
    closed_by: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE pos_session SET status = 'closed', closing_cash = ?1, notes = COALESCE(?2, notes), closed_by = ?3, closed_at = ?4 WHERE id = ?5 AND status = 'open'",
    )
    .bind(closing_cash)
    .bind(notes)
    .bind(closed_by)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
