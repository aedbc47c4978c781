use std::fmt;

use serde_json::Value;
use shared::message::{EventName, Scope};
use shared::models::{PosSession, PosSessionClose, PosSessionOpen, PosSessionStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::auth::permissions::{CASH_DRAWER_OPEN, ROLE_ADMIN};
use crate::auth::{AccessPolicy, CurrentUser};
use crate::db::repository::{RepoError, branch, pos_session};
use crate::realtime::RealtimeBus;
use crate::utils::money::{require_amount, round_money};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Closing cash from a JSON number or decimal string.
///
/// Missing, non-numeric, negative and non-finite values are all
/// `InvalidAmount`.
pub fn parse_cash(value: Option<&Value>, field: &str) -> AppResult<f64> {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidAmount, format!("{field} is required and must be a number"))
            .with_detail("field", field)
    })?;
    require_amount(amount, field, ErrorCode::InvalidAmount)?;
    Ok(round_money(amount))
}

#[derive(Clone)]
pub struct PosSessionManager {
    pool: SqlitePool,
    bus: RealtimeBus,
}

impl fmt::Debug for PosSessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosSessionManager").finish_non_exhaustive()
    }
}

impl PosSessionManager {
    pub fn new(pool: SqlitePool, bus: RealtimeBus) -> Self {
        Self { pool, bus }
    }

    pub async fn open(&self, caller: &CurrentUser, input: &PosSessionOpen) -> AppResult<PosSession> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::require_permission(caller, CASH_DRAWER_OPEN)?;
        AccessPolicy::check_branch(caller, input.branch_id)?;
        validate_required_text(&input.terminal_id, "terminal_id", MAX_SHORT_TEXT_LEN)?;
        let opening_cash = input.opening_cash.unwrap_or(0.0);
        require_amount(opening_cash, "opening_cash", ErrorCode::InvalidAmount)?;

        branch::find_by_id(&self.pool, input.branch_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::BranchNotFound, input.branch_id))?;

        if let Some(open) = pos_session::find_open_by_branch(&self.pool, input.branch_id).await? {
            return Err(already_open(input.branch_id, Some(&open)));
        }

        let id = snowflake_id();
        match pos_session::insert_open(
            &self.pool,
            id,
            input.branch_id,
            input.terminal_id.trim(),
            round_money(opening_cash),
            caller.id,
            now_millis(),
        )
        .await
        {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => return Err(already_open(input.branch_id, None)),
            Err(e) => return Err(e.into()),
        }

        let session = self.find(id).await?;
        tracing::info!(
            session_id = id,
            branch_id = session.branch_id,
            terminal_id = %session.terminal_id,
            session_number = session.session_number,
            opening_cash = session.opening_cash,
            opened_by = caller.id,
            "POS session opened"
        );
        self.publish(&session);
        Ok(session)
    }

    pub async fn close(&self, caller: &CurrentUser, id: i64, input: &PosSessionClose) -> AppResult<PosSession> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::require_permission(caller, CASH_DRAWER_OPEN)?;
        let closing_cash = parse_cash(input.closing_cash.as_ref(), "closing_cash")?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;

        let session = self.find(id).await?;
        AccessPolicy::check_branch(caller, session.branch_id)?;
        if session.status == PosSessionStatus::Closed {
            return Err(already_closed(id));
        }

        let closed = pos_session::close(
            &self.pool,
            id,
            closing_cash,
            input.notes.as_deref(),
            caller.id,
            now_millis(),
        )
        .await?;
        if !closed {
            return Err(already_closed(id));
        }

        let session = self.find(id).await?;
        tracing::info!(
            session_id = id,
            branch_id = session.branch_id,
            opening_cash = session.opening_cash,
            closing_cash,
            closed_by = caller.id,
            "POS session closed"
        );
        self.publish(&session);
        Ok(session)
    }

    pub async fn get_active(&self, caller: &CurrentUser, branch_id: i64) -> AppResult<Option<PosSession>> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::check_branch(caller, branch_id)?;
        self.active_for_branch(branch_id).await
    }

    /// Open session of a branch, for linking POS orders
    pub async fn active_for_branch(&self, branch_id: i64) -> AppResult<Option<PosSession>> {
        Ok(pos_session::find_open_by_branch(&self.pool, branch_id).await?)
    }

    async fn find(&self, id: i64) -> AppResult<PosSession> {
        pos_session::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::SessionNotFound, id))
    }

    fn publish(&self, session: &PosSession) {
        self.bus.emit(
            EventName::PosSessionUpdated,
            session,
            &[Scope::branch(session.branch_id), Scope::role(ROLE_ADMIN)],
        );
    }
}

fn already_open(branch_id: i64, open: Option<&PosSession>) -> AppError {
    let err = AppError::with_message(
        ErrorCode::SessionAlreadyOpen,
        format!("Branch {branch_id} already has an open POS session"),
    )
    .with_detail("branch_id", branch_id);
    match open {
        Some(session) => err.with_detail("session_id", session.id),
        None => err,
    }
}

fn already_closed(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::SessionAlreadyClosed,
        format!("POS session {id} is already closed"),
    )
    .with_detail("session_id", id)
}
