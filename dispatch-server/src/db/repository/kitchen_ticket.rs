//! Kitchen Ticket Repository

use super::{RepoError, RepoResult};
use shared::models::{KitchenTicket, TicketItem, TicketStatus};
use sqlx::SqlitePool;

const TICKET_COLUMNS: &str =
    "id, order_id, branch_id, ticket_number, status, items, notes, created_at, updated_at";

/// Insert a queued ticket numbered after the last ticket of the branch
pub async fn insert(
    pool: &SqlitePool,
    id: i64,
    order_id: i64,
    branch_id: i64,
    items: &[TicketItem],
    notes: Option<&str>,
    now: i64,
) -> RepoResult<KitchenTicket> {
    let items_json =
        serde_json::to_string(items).map_err(|e| RepoError::Validation(e.to_string()))?;
    sqlx::query(
        "INSERT INTO kitchen_ticket (id, order_id, branch_id, ticket_number, status, items, notes, created_at, updated_at) \
         SELECT ?1, ?2, ?3, COALESCE(MAX(ticket_number), 0) + 1, 'queued', ?4, ?5, ?6, ?6 FROM kitchen_ticket WHERE branch_id = ?3",
    )
    .bind(id)
    .bind(order_id)
    .bind(branch_id)
    .bind(items_json)
    .bind(notes)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create kitchen ticket".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<KitchenTicket>> {
    let ticket = sqlx::query_as::<_, KitchenTicket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM kitchen_ticket WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(ticket)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<KitchenTicket>> {
    let tickets = sqlx::query_as::<_, KitchenTicket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM kitchen_ticket WHERE order_id = ? ORDER BY ticket_number"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(tickets)
}

/// Tickets of a branch that have not been served yet
pub async fn find_open_by_branch(pool: &SqlitePool, branch_id: i64) -> RepoResult<Vec<KitchenTicket>> {
    let tickets = sqlx::query_as::<_, KitchenTicket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM kitchen_ticket WHERE branch_id = ? AND status <> 'served' ORDER BY ticket_number"
    ))
    .bind(branch_id)
    .fetch_all(pool)
    .await?;
    Ok(tickets)
}

/// Move `from → to`; false when the ticket is no longer in `from`
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    from: TicketStatus,
    to: TicketStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE kitchen_ticket SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(to.as_str())
    .bind(now)
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
