use std::fmt;

use shared::message::{EventName, Scope};
use shared::models::{KitchenTicket, KitchenTicketCreate, Order, TicketItem, TicketStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::auth::{AccessPolicy, CurrentUser};
use crate::db::repository::{kitchen_ticket, order};
use crate::realtime::RealtimeBus;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const fn rank(status: TicketStatus) -> u8 {
    match status {
        TicketStatus::Queued => 0,
        TicketStatus::Preparing => 1,
        TicketStatus::Ready => 2,
        TicketStatus::Served => 3,
    }
}

/// Tickets only move forward; skipping a stage is allowed
pub fn can_advance(from: TicketStatus, to: TicketStatus) -> bool {
    rank(to) > rank(from)
}

#[derive(Clone)]
pub struct KitchenTicketTracker {
    pool: SqlitePool,
    bus: RealtimeBus,
}

impl fmt::Debug for KitchenTicketTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KitchenTicketTracker").finish_non_exhaustive()
    }
}

impl KitchenTicketTracker {
    pub fn new(pool: SqlitePool, bus: RealtimeBus) -> Self {
        Self { pool, bus }
    }

    /// Queue a ticket for `line_nos` of the order (all lines when `None`)
    pub async fn create_for_order(
        &self,
        order: &Order,
        line_nos: Option<&[i64]>,
        notes: Option<&str>,
    ) -> AppResult<KitchenTicket> {
        let items = ticket_items(order, line_nos)?;
        let ticket = kitchen_ticket::insert(
            &self.pool,
            snowflake_id(),
            order.id,
            order.branch_id,
            &items,
            notes,
            now_millis(),
        )
        .await?;

        tracing::info!(
            ticket_id = ticket.id,
            order_id = order.id,
            branch_id = order.branch_id,
            ticket_number = ticket.ticket_number,
            items = ticket.items.len(),
            "Kitchen ticket queued"
        );
        self.bus.emit(
            EventName::KitchenTicketCreated,
            &ticket,
            &[Scope::branch(ticket.branch_id)],
        );
        Ok(ticket)
    }

    /// Extra ticket for an existing order (reprint, added items)
    pub async fn create(&self, caller: &CurrentUser, input: &KitchenTicketCreate) -> AppResult<KitchenTicket> {
        AccessPolicy::require_operator(caller)?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
        let order = order::find_by_id(&self.pool, input.order_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::OrderNotFound, input.order_id))?;
        AccessPolicy::check_branch(caller, order.branch_id)?;
        self.create_for_order(&order, input.line_nos.as_deref(), input.notes.as_deref())
            .await
    }

    pub async fn update_status(
        &self,
        caller: &CurrentUser,
        id: i64,
        status: &str,
    ) -> AppResult<KitchenTicket> {
        AccessPolicy::require_operator(caller)?;
        let to: TicketStatus = status.parse().map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidStatusValue,
                format!("Unknown ticket status '{status}'"),
            )
            .with_detail("status", status)
        })?;

        let ticket = self.find(id).await?;
        AccessPolicy::check_branch(caller, ticket.branch_id)?;

        if ticket.status == to {
            return Ok(ticket);
        }
        if !can_advance(ticket.status, to) {
            return Err(invalid_transition(&ticket, to));
        }

        let now = now_millis();
        if !kitchen_ticket::update_status(&self.pool, id, ticket.status, to, now).await? {
            // moved concurrently; report against the fresh state
            let current = self.find(id).await?;
            return Err(invalid_transition(&current, to));
        }

        let updated = KitchenTicket {
            status: to,
            updated_at: now,
            ..ticket
        };
        tracing::info!(
            ticket_id = id,
            order_id = updated.order_id,
            status = %to,
            "Kitchen ticket updated"
        );
        self.bus.emit(
            EventName::KitchenTicketUpdated,
            &updated,
            &[Scope::branch(updated.branch_id)],
        );
        Ok(updated)
    }

    /// Unserved tickets of the caller's branch, by ticket number
    pub async fn list_open(&self, caller: &CurrentUser, branch_id: Option<i64>) -> AppResult<Vec<KitchenTicket>> {
        AccessPolicy::require_operator(caller)?;
        let branch_id = AccessPolicy::resolve_scope(caller, branch_id)?.require_branch()?;
        Ok(kitchen_ticket::find_open_by_branch(&self.pool, branch_id).await?)
    }

    /// Every ticket printed for an order, oldest first
    pub async fn for_order(&self, caller: &CurrentUser, order_id: i64) -> AppResult<Vec<KitchenTicket>> {
        AccessPolicy::require_operator(caller)?;
        let order = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::OrderNotFound, order_id))?;
        AccessPolicy::check_branch(caller, order.branch_id)?;
        Ok(kitchen_ticket::find_by_order(&self.pool, order_id).await?)
    }

    async fn find(&self, id: i64) -> AppResult<KitchenTicket> {
        kitchen_ticket::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::TicketNotFound, id))
    }
}

fn invalid_transition(ticket: &KitchenTicket, to: TicketStatus) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidTicketTransition,
        format!(
            "Kitchen ticket {} cannot move from {} to {}",
            ticket.id, ticket.status, to
        ),
    )
    .with_detail("from", ticket.status.as_str())
    .with_detail("to", to.as_str())
}

fn ticket_items(order: &Order, line_nos: Option<&[i64]>) -> AppResult<Vec<TicketItem>> {
    let selected: Vec<_> = match line_nos {
        None => order.items.iter().collect(),
        Some([]) => {
            return Err(AppError::validation("line_nos must not be empty").with_detail("field", "line_nos"));
        }
        Some(lines) => {
            let mut selected = Vec::with_capacity(lines.len());
            for line_no in lines {
                let item = order
                    .items
                    .iter()
                    .find(|i| i.line_no == *line_no)
                    .ok_or_else(|| {
                        AppError::validation(format!("Order {} has no line {}", order.id, line_no))
                            .with_detail("line_no", *line_no)
                    })?;
                selected.push(item);
            }
            selected
        }
    };

    Ok(selected
        .into_iter()
        .map(|item| TicketItem {
            line_no: item.line_no,
            menu_item_id: item.menu_item_id,
            name: item.name.clone(),
            quantity: item.quantity,
            variants: item.variants.iter().map(|v| v.name.clone()).collect(),
            notes: item.notes.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ServerState;
    use crate::realtime::Subscription;
    use crate::test_support;
    use shared::models::{OrderCreate, OrderItemInput, OrderSource, OrderType, PaymentMethod};

    async fn order_with_two_lines(state: &ServerState, staff: &CurrentUser) -> Order {
        test_support::seed_branch(&state.pool, 1, None).await;
        test_support::seed_branch(&state.pool, 2, None).await;
        test_support::seed_menu_item(&state.pool, 10, 250.0).await;
        test_support::seed_menu_item(&state.pool, 11, 80.0).await;
        let line = |menu_item_id| OrderItemInput {
            menu_item_id,
            quantity: 1,
            variant_ids: vec![],
            unit_price: None,
            notes: None,
        };
        let input = OrderCreate {
            branch_id: 1,
            customer_id: None,
            order_type: OrderType::Takeaway,
            source: OrderSource::Phone,
            items: vec![line(10), line(11)],
            payment_method: PaymentMethod::Cash,
            table_id: None,
            delivery_address: None,
            delivery_distance: None,
            notes: None,
        };
        state.orders.create(staff, input).await.unwrap()
    }

    fn drain(feed: &mut Subscription) -> Vec<String> {
        std::iter::from_fn(|| feed.try_recv())
            .map(|frame| frame.to_string())
            .collect()
    }

    #[tokio::test]
    async fn reprint_selects_lines_and_rejects_bad_selection() {
        let state = test_support::state().await;
        let staff = test_support::user(2, "staff", Some(1));
        let order = order_with_two_lines(&state, &staff).await;
        let second_line = order.items[1].line_no;

        let reprint = state
            .kitchen
            .create(
                &staff,
                &KitchenTicketCreate {
                    order_id: order.id,
                    line_nos: Some(vec![second_line]),
                    notes: Some("extra sauce".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(reprint.status, TicketStatus::Queued);
        assert_eq!(reprint.items.len(), 1);
        assert_eq!(reprint.items[0].menu_item_id, 11);

        let tickets = state.kitchen.for_order(&staff, order.id).await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets[0].ticket_number < tickets[1].ticket_number);

        let empty = KitchenTicketCreate {
            order_id: order.id,
            line_nos: Some(vec![]),
            notes: None,
        };
        let err = state.kitchen.create(&staff, &empty).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let unknown = KitchenTicketCreate {
            order_id: order.id,
            line_nos: Some(vec![second_line, 99]),
            notes: None,
        };
        let err = state.kitchen.create(&staff, &unknown).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.unwrap()["line_no"], 99);
        assert_eq!(state.kitchen.for_order(&staff, order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn status_moves_forward_only() {
        let state = test_support::state().await;
        let staff = test_support::user(2, "staff", Some(1));
        let order = order_with_two_lines(&state, &staff).await;
        let ticket = state.kitchen.for_order(&staff, order.id).await.unwrap().remove(0);

        let ready = state.kitchen.update_status(&staff, ticket.id, "ready").await.unwrap();
        assert_eq!(ready.status, TicketStatus::Ready);

        let again = state.kitchen.update_status(&staff, ticket.id, "ready").await.unwrap();
        assert_eq!(again.status, TicketStatus::Ready);
        assert_eq!(again.updated_at, ready.updated_at);

        let err = state
            .kitchen
            .update_status(&staff, ticket.id, "preparing")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTicketTransition);
        assert_eq!(err.details.unwrap()["from"], "ready");

        let stored = kitchen_ticket::find_by_id(&state.pool, ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Ready);
    }

    #[tokio::test]
    async fn unknown_ticket_and_status_are_rejected() {
        let state = test_support::state().await;
        let staff = test_support::user(2, "staff", Some(1));
        let err = state.kitchen.update_status(&staff, 424242, "served").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TicketNotFound);

        let err = state.kitchen.update_status(&staff, 424242, "burnt").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusValue);
    }

    #[tokio::test]
    async fn other_branch_staff_cannot_touch_tickets() {
        let state = test_support::state().await;
        let staff = test_support::user(2, "staff", Some(1));
        let order = order_with_two_lines(&state, &staff).await;
        let ticket = state.kitchen.for_order(&staff, order.id).await.unwrap().remove(0);

        let outsider = test_support::user(3, "staff", Some(2));
        let err = state.kitchen.update_status(&outsider, ticket.id, "ready").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchScopeDenied);
        let err = state.kitchen.for_order(&outsider, order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchScopeDenied);
    }

    #[tokio::test]
    async fn ticket_events_stay_in_their_branch() {
        let state = test_support::state().await;
        let staff = test_support::user(2, "staff", Some(1));
        let order = order_with_two_lines(&state, &staff).await;

        let mut own = state.bus.subscribe(vec![Scope::branch(1)]);
        let mut other = state.bus.subscribe(vec![Scope::branch(2)]);
        let mut admins = state.bus.subscribe(vec![Scope::role("admin")]);

        let ticket = state
            .kitchen
            .create(
                &staff,
                &KitchenTicketCreate {
                    order_id: order.id,
                    line_nos: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        state.kitchen.update_status(&staff, ticket.id, "preparing").await.unwrap();

        let frames = drain(&mut own);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("kitchen.ticketCreated"));
        assert!(frames[1].contains("kitchen.ticketUpdated"));
        assert!(drain(&mut other).is_empty());
        assert!(drain(&mut admins).is_empty());
    }

    #[test]
    fn only_forward_moves() {
        assert!(can_advance(TicketStatus::Queued, TicketStatus::Preparing));
        assert!(can_advance(TicketStatus::Queued, TicketStatus::Ready));
        assert!(can_advance(TicketStatus::Ready, TicketStatus::Served));
        assert!(!can_advance(TicketStatus::Ready, TicketStatus::Preparing));
        assert!(!can_advance(TicketStatus::Served, TicketStatus::Queued));
        assert!(!can_advance(TicketStatus::Preparing, TicketStatus::Preparing));
    }
}
