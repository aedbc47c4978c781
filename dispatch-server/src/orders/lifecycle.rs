use std::fmt;

use serde_json::{Map, Value};
use shared::message::{EventName, Scope, TableStatus, TableStatusPayload};
use shared::models::{
    DeliveryChargeRequest, DiscountApply, MenuItemVariant, Order, OrderCreate, OrderItem,
    OrderItemInput, OrderSource, OrderStatus, OrderType, PaymentCallback, PaymentMethod,
    PaymentRecord, PaymentStatus, VariantSelection,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::payment;
use crate::auth::permissions::{
    ORDERS_DISCOUNT, ORDERS_MODIFY_PRICE, ORDERS_VOID, ROLE_ADMIN, ROLE_STAFF,
};
use crate::auth::{AccessPolicy, CurrentUser};
use crate::db::repository::side_effect::SideEffectKind;
use crate::db::repository::{RepoError, branch, menu_item, order, pos_session, side_effect};
use crate::kitchen::KitchenTicketTracker;
use crate::pricing::PricingEngine;
use crate::realtime::RealtimeBus;
use crate::side_effects::SideEffectQueue;
use crate::utils::money::{line_total, order_total, require_amount, round_money, sum_amounts, to_decimal, to_f64};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NOTE_LEN, MAX_ORDER_LINES, MAX_QUANTITY, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

const fn rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Pending => 0,
        OrderStatus::Preparing => 1,
        OrderStatus::Ready => 2,
        OrderStatus::Completed => 3,
        OrderStatus::Cancelled => 4,
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Completed | OrderStatus::Cancelled)
}

/// Forward along `pending → preparing → ready → completed`, or cancel
/// from any non-terminal state
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    if is_terminal(from) || from == to {
        return false;
    }
    to == OrderStatus::Cancelled || rank(to) > rank(from)
}

/// Owner of the order state machine.
///
/// Every mutation re-reads the order from the store and writes with a
/// condition on the state it read.
#[derive(Clone)]
pub struct OrderLifecycle {
    pool: SqlitePool,
    bus: RealtimeBus,
    pricing: PricingEngine,
    kitchen: KitchenTicketTracker,
    side_effects: SideEffectQueue,
}

impl fmt::Debug for OrderLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderLifecycle").finish_non_exhaustive()
    }
}

impl OrderLifecycle {
    pub fn new(
        pool: SqlitePool,
        bus: RealtimeBus,
        pricing: PricingEngine,
        kitchen: KitchenTicketTracker,
        side_effects: SideEffectQueue,
    ) -> Self {
        Self {
            pool,
            bus,
            pricing,
            kitchen,
            side_effects,
        }
    }

    /// Price, persist and announce a new order.
    ///
    /// The order, its lines and its outbox jobs commit together. The
    /// kitchen ticket and events follow the commit; their failures are
    /// logged and never fail the request.
    pub async fn create(&self, caller: &CurrentUser, input: OrderCreate) -> AppResult<Order> {
        AccessPolicy::check_branch(caller, input.branch_id)?;
        let customer_id = resolve_customer(caller, &input)?;
        validate_input(&input)?;

        branch::find_by_id(&self.pool, input.branch_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::BranchNotFound, input.branch_id))?;

        let order_id = snowflake_id();
        let mut items = Vec::with_capacity(input.items.len());
        for (index, line) in input.items.iter().enumerate() {
            items.push(self.price_line(caller, &input, order_id, index as i64 + 1, line).await?);
        }
        let subtotal = sum_amounts(items.iter().map(|i| i.line_total));

        let (delivery_charge, delivery_distance, delivery_address) = if input.order_type == OrderType::Delivery {
            let quote = self
                .pricing
                .compute_delivery_charge(&DeliveryChargeRequest {
                    branch_id: input.branch_id,
                    order_amount: subtotal,
                    distance: input.delivery_distance,
                    delivery_address: input.delivery_address.clone(),
                })
                .await?;
            if let Some(reason) = &quote.fallback_reason {
                tracing::info!(order_id, reason = %reason, "Delivery priced with static fallback");
            }
            (quote.delivery_charges, quote.distance, input.delivery_address.clone())
        } else {
            (0.0, None, None)
        };

        let pos_session_id = if input.source == OrderSource::Pos {
            let session = pos_session::find_open_by_branch(&self.pool, input.branch_id)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::SessionNotFound,
                        format!("Branch {} has no open POS session", input.branch_id),
                    )
                    .with_detail("branch_id", input.branch_id)
                })?;
            Some(session.id)
        } else {
            None
        };

        let payment_status = if input.order_type == OrderType::DineIn && input.payment_method == PaymentMethod::Cash {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        };

        let now = now_millis();
        let order = Order {
            id: order_id,
            branch_id: input.branch_id,
            customer_id,
            order_type: input.order_type,
            source: input.source,
            subtotal,
            discount: 0.0,
            discount_reason: None,
            delivery_charge,
            delivery_distance,
            delivery_address,
            total: order_total(subtotal, 0.0, delivery_charge),
            payment_method: input.payment_method,
            payment_status,
            payment_metadata: Value::Object(Map::new()),
            status: OrderStatus::Pending,
            table_id: input.table_id.filter(|_| input.order_type == OrderType::DineIn),
            pos_session_id,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            items,
        };

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        order::insert(&mut *tx, &order).await?;
        for kind in SideEffectKind::ALL {
            if kind == SideEffectKind::LoyaltyAccrual && order.customer_id.is_none() {
                continue;
            }
            side_effect::enqueue(&mut *tx, snowflake_id(), order.id, kind, now).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;
        self.side_effects.notify();

        tracing::info!(
            order_id = order.id,
            branch_id = order.branch_id,
            order_type = %order.order_type,
            source = %order.source,
            lines = order.items.len(),
            total = order.total,
            created_by = caller.id,
            "Order created"
        );

        if let Err(e) = self.kitchen.create_for_order(&order, None, None).await {
            tracing::error!(order_id = order.id, error = %e, "Failed to queue kitchen ticket");
        }

        self.bus.emit(
            EventName::OrderCreated,
            &order,
            &[
                Scope::branch(order.branch_id),
                Scope::role(ROLE_ADMIN),
                Scope::role(ROLE_STAFF),
            ],
        );
        if let Some(table_id) = order.table_id {
            self.publish_table(&order, table_id, TableStatus::Occupied);
        }
        Ok(order)
    }

    pub async fn get(&self, caller: &CurrentUser, id: i64) -> AppResult<Order> {
        let order = self.find(id).await?;
        authorize_read(caller, &order)?;
        Ok(order)
    }

    /// Replace the discount; the status is left untouched
    pub async fn apply_discount(&self, caller: &CurrentUser, id: i64, input: &DiscountApply) -> AppResult<Order> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::require_permission(caller, ORDERS_DISCOUNT)?;
        validate_optional_text(&input.reason, "reason", MAX_NOTE_LEN)?;
        if !input.amount.is_finite() || input.amount < 0.0 {
            return Err(AppError::with_message(
                ErrorCode::InvalidDiscount,
                format!("Discount must be a non-negative amount, got {}", input.amount),
            )
            .with_detail("amount", input.amount.to_string()));
        }

        let order = self.find(id).await?;
        AccessPolicy::check_branch(caller, order.branch_id)?;

        let amount = round_money(input.amount);
        if to_decimal(amount) > to_decimal(order.subtotal) {
            return Err(AppError::with_message(
                ErrorCode::InvalidDiscount,
                format!(
                    "Discount {:.2} exceeds order subtotal {:.2}",
                    amount, order.subtotal
                ),
            )
            .with_detail("amount", amount)
            .with_detail("subtotal", order.subtotal));
        }

        let total = order_total(order.subtotal, amount, order.delivery_charge);
        let now = now_millis();
        if !order::update_discount(&self.pool, id, amount, input.reason.as_deref(), total, now).await? {
            return Err(AppError::entity_not_found(ErrorCode::OrderNotFound, id));
        }

        tracing::info!(order_id = id, discount = amount, total, applied_by = caller.id, "Discount applied");
        Ok(Order {
            discount: amount,
            discount_reason: input.reason.clone(),
            total,
            updated_at: now,
            ..order
        })
    }

    pub async fn transition_status(&self, caller: &CurrentUser, id: i64, status: &str) -> AppResult<Order> {
        let to: OrderStatus = status.parse().map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidStatusValue,
                format!("Unknown order status '{status}'"),
            )
            .with_detail("status", status)
        })?;

        let order = self.find(id).await?;
        AccessPolicy::check_branch(caller, order.branch_id)?;
        AccessPolicy::require_operator(caller)?;
        if to == OrderStatus::Cancelled {
            AccessPolicy::require_permission(caller, ORDERS_VOID)?;
        }

        if !can_transition(order.status, to) {
            return Err(invalid_transition(&order, to));
        }
        let now = now_millis();
        if !order::update_status(&self.pool, id, order.status, to, now).await? {
            let current = self.find(id).await?;
            return Err(invalid_transition(&current, to));
        }

        let updated = Order {
            status: to,
            updated_at: now,
            completed_at: if to == OrderStatus::Completed { Some(now) } else { order.completed_at },
            ..order
        };
        tracing::info!(order_id = id, status = %to, changed_by = caller.id, "Order status updated");

        let mut scopes = vec![
            Scope::branch(updated.branch_id),
            Scope::role(ROLE_ADMIN),
            Scope::role(ROLE_STAFF),
        ];
        if let Some(customer_id) = updated.customer_id {
            scopes.push(Scope::user(customer_id));
        }
        self.bus.emit(EventName::OrderStatusUpdated, &updated, &scopes);
        if let Some(table_id) = updated.table_id
            && is_terminal(to)
        {
            self.publish_table(&updated, table_id, TableStatus::Available);
        }
        Ok(updated)
    }

    /// Operator-recorded payment; customers may only submit their own
    /// wallet reference for verification
    pub async fn record_payment(&self, caller: &CurrentUser, id: i64, record: &PaymentRecord) -> AppResult<Order> {
        let order = self.find(id).await?;
        if caller.is_customer() {
            AccessPolicy::check_owner(caller, order.customer_id)?;
            if record.status != PaymentStatus::AwaitingVerification {
                return Err(AppError::permission_denied(
                    "Customers can only submit payments for verification",
                ));
            }
        } else {
            AccessPolicy::require_operator(caller)?;
            AccessPolicy::check_branch(caller, order.branch_id)?;
        }
        let updated = self.apply_payment(order, record).await?;
        tracing::info!(
            order_id = id,
            method = %updated.payment_method,
            status = %updated.payment_status,
            recorded_by = caller.id,
            "Payment recorded"
        );
        Ok(updated)
    }

    /// Provider callback mapped onto the payment machine
    pub async fn payment_callback(&self, callback: &PaymentCallback) -> AppResult<Order> {
        let order = self.find(callback.order_id).await?;
        let mut metadata = callback.payload.clone().unwrap_or_default();
        metadata.insert("provider".into(), Value::String(callback.provider.clone()));
        let record = PaymentRecord {
            method: callback.method,
            status: callback.status,
            transaction_id: callback.transaction_id.clone(),
            gateway_transaction_id: None,
            metadata: Some(metadata),
        };
        let updated = self.apply_payment(order, &record).await?;
        tracing::info!(
            order_id = updated.id,
            provider = %callback.provider,
            status = %updated.payment_status,
            "Payment callback applied"
        );
        Ok(updated)
    }

    async fn apply_payment(&self, order: Order, record: &PaymentRecord) -> AppResult<Order> {
        payment::validate_record(order.payment_status, &order.payment_metadata, record)?;
        let metadata = payment::merge_metadata(&order.payment_metadata, record);
        let now = now_millis();
        let written = order::update_payment(
            &self.pool,
            order.id,
            order.payment_status,
            record.method,
            record.status,
            &metadata,
            now,
        )
        .await?;
        if !written {
            return Err(AppError::with_message(
                ErrorCode::InvalidPaymentTransition,
                format!("Payment of order {} changed concurrently, retry", order.id),
            ));
        }
        Ok(Order {
            payment_method: record.method,
            payment_status: record.status,
            payment_metadata: metadata,
            updated_at: now,
            ..order
        })
    }

    async fn price_line(
        &self,
        caller: &CurrentUser,
        input: &OrderCreate,
        order_id: i64,
        line_no: i64,
        line: &OrderItemInput,
    ) -> AppResult<OrderItem> {
        let item = menu_item::find_by_id(&self.pool, line.menu_item_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::MenuItemNotFound, line.menu_item_id))?;
        if !item.is_available {
            return Err(AppError::with_message(
                ErrorCode::MenuItemUnavailable,
                format!("Menu item {} ({}) is not available", item.id, item.name),
            )
            .with_detail("menu_item_id", item.id));
        }

        let variants = if line.variant_ids.is_empty() {
            Vec::new()
        } else {
            let catalogue = menu_item::find_variants(&self.pool, item.id).await?;
            line.variant_ids
                .iter()
                .map(|vid| select_variant(&catalogue, item.id, *vid))
                .collect::<AppResult<Vec<_>>>()?
        };

        let catalogue_price = to_f64(
            to_decimal(item.price) + variants.iter().map(|v| to_decimal(v.price_delta)).sum::<rust_decimal::Decimal>(),
        );
        let unit_price = match line.unit_price {
            Some(price) if input.source == OrderSource::Pos => {
                AccessPolicy::require_permission(caller, ORDERS_MODIFY_PRICE)?;
                require_amount(price, "unit_price", ErrorCode::ValidationFailed)?;
                if price != catalogue_price {
                    tracing::info!(
                        order_id,
                        line_no,
                        menu_item_id = item.id,
                        catalogue_price,
                        override_price = price,
                        overridden_by = caller.id,
                        "POS price override"
                    );
                }
                round_money(price)
            }
            Some(_) => {
                tracing::debug!(order_id, line_no, "Ignoring client unit price on non-POS order");
                catalogue_price
            }
            None => catalogue_price,
        };

        Ok(OrderItem {
            id: snowflake_id(),
            order_id,
            line_no,
            menu_item_id: item.id,
            name: item.name,
            quantity: line.quantity,
            unit_price,
            line_total: line_total(unit_price, line.quantity),
            variants,
            notes: line.notes.clone(),
        })
    }

    async fn find(&self, id: i64) -> AppResult<Order> {
        order::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::OrderNotFound, id))
    }

    fn publish_table(&self, order: &Order, table_id: i64, status: TableStatus) {
        self.bus.emit(
            EventName::TableStatusUpdated,
            &TableStatusPayload {
                branch_id: order.branch_id,
                table_id,
                status,
                order_id: order.id,
            },
            &[Scope::branch(order.branch_id)],
        );
    }
}

/// Customers order for themselves; staff may name any customer
fn resolve_customer(caller: &CurrentUser, input: &OrderCreate) -> AppResult<Option<i64>> {
    if caller.is_customer() {
        if input.source != OrderSource::Online {
            return Err(AppError::permission_denied(format!(
                "Customers cannot create {} orders",
                input.source
            )));
        }
        AccessPolicy::check_owner(caller, Some(input.customer_id.unwrap_or(caller.id)))?;
        return Ok(Some(caller.id));
    }
    AccessPolicy::require_operator(caller)?;
    Ok(input.customer_id)
}

fn validate_input(input: &OrderCreate) -> AppResult<()> {
    if input.items.is_empty() {
        return Err(AppError::with_message(ErrorCode::OrderEmpty, "Order must contain at least one item"));
    }
    if input.items.len() > MAX_ORDER_LINES {
        return Err(AppError::validation(format!(
            "Order has too many lines ({}, max {MAX_ORDER_LINES})",
            input.items.len()
        )));
    }
    for (index, line) in input.items.iter().enumerate() {
        if line.quantity < 1 || line.quantity > MAX_QUANTITY {
            return Err(AppError::validation(format!(
                "quantity must be between 1 and {MAX_QUANTITY}, got {}",
                line.quantity
            ))
            .with_detail("line", index as i64 + 1));
        }
        validate_optional_text(&line.notes, "notes", MAX_NOTE_LEN)?;
    }
    validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;

    match input.order_type {
        OrderType::Delivery => {
            let address = input.delivery_address.as_deref().unwrap_or_default();
            validate_required_text(address, "delivery_address", MAX_ADDRESS_LEN)?;
            if let Some(d) = input.delivery_distance
                && (!d.is_finite() || d < 0.0)
            {
                return Err(AppError::validation("delivery_distance must be a non-negative number")
                    .with_detail("field", "delivery_distance"));
            }
        }
        OrderType::DineIn | OrderType::Takeaway => {}
    }
    Ok(())
}

fn select_variant(catalogue: &[MenuItemVariant], menu_item_id: i64, variant_id: i64) -> AppResult<VariantSelection> {
    catalogue
        .iter()
        .find(|v| v.id == variant_id)
        .map(|v| VariantSelection {
            variant_id: v.id,
            name: v.name.clone(),
            price_delta: v.price_delta,
        })
        .ok_or_else(|| {
            AppError::validation(format!("Variant {variant_id} does not belong to menu item {menu_item_id}"))
                .with_detail("variant_id", variant_id)
        })
}

/// Operators of the branch, or the owning customer
fn authorize_read(caller: &CurrentUser, order: &Order) -> AppResult<()> {
    if caller.is_customer() {
        AccessPolicy::check_owner(caller, order.customer_id)
    } else {
        AccessPolicy::check_branch(caller, order.branch_id)
    }
}

fn invalid_transition(order: &Order, to: OrderStatus) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidStatusTransition,
        format!("Order {} cannot move from {} to {}", order.id, order.status, to),
    )
    .with_detail("from", order.status.as_str())
    .with_detail("to", to.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ServerState;
    use crate::db::repository::kitchen_ticket;
    use crate::test_support;
    use shared::models::PosSessionOpen;

    fn line(menu_item_id: i64, quantity: i64) -> OrderItemInput {
        OrderItemInput {
            menu_item_id,
            quantity,
            variant_ids: vec![],
            unit_price: None,
            notes: None,
        }
    }

    fn create_input(order_type: OrderType, source: OrderSource, items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            branch_id: 1,
            customer_id: None,
            order_type,
            source,
            items,
            payment_method: PaymentMethod::Cash,
            table_id: None,
            delivery_address: None,
            delivery_distance: None,
            notes: None,
        }
    }

    async fn seeded() -> ServerState {
        let state = test_support::state().await;
        test_support::seed_branch(&state.pool, 1, Some((24.86, 67.0))).await;
        test_support::seed_menu_item(&state.pool, 10, 250.0).await;
        test_support::seed_menu_item(&state.pool, 11, 99.5).await;
        test_support::seed_variant(&state.pool, 100, 10, 40.0).await;
        state
    }

    #[test]
    fn status_machine() {
        use OrderStatus::*;
        assert!(can_transition(Pending, Preparing));
        assert!(can_transition(Preparing, Completed));
        assert!(can_transition(Ready, Cancelled));
        assert!(!can_transition(Ready, Pending));
        assert!(!can_transition(Completed, Cancelled));
        assert!(!can_transition(Cancelled, Pending));
        assert!(!can_transition(Pending, Pending));
    }

    #[tokio::test]
    async fn create_prices_from_menu_and_queues_ticket() {
        let state = seeded().await;
        let staff = test_support::user(2, "staff", Some(1));
        let mut first = line(10, 2);
        first.variant_ids = vec![100];
        // ignored outside POS
        first.unit_price = Some(1.0);
        let mut input = create_input(OrderType::DineIn, OrderSource::Phone, vec![first, line(11, 1)]);
        input.table_id = Some(7);

        let order = state.orders.create(&staff, input).await.unwrap();
        assert_eq!(order.items[0].unit_price, 290.0);
        assert_eq!(order.items[0].line_total, 580.0);
        assert_eq!(order.items[0].variants[0].variant_id, 100);
        assert_eq!(order.subtotal, 679.5);
        assert_eq!(order.total, 679.5);
        assert_eq!(order.delivery_charge, 0.0);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Pending);

        let stored = state.orders.get(&staff, order.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.table_id, Some(7));

        let tickets = kitchen_ticket::find_by_order(&state.pool, order.id).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].items.len(), 2);
        assert_eq!(tickets[0].items[0].variants, vec!["Variant 100".to_string()]);
    }

    #[tokio::test]
    async fn empty_order_and_unknown_item_are_rejected() {
        let state = seeded().await;
        let staff = test_support::user(2, "staff", Some(1));
        let err = state
            .orders
            .create(&staff, create_input(OrderType::Takeaway, OrderSource::Phone, vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);

        let err = state
            .orders
            .create(&staff, create_input(OrderType::Takeaway, OrderSource::Phone, vec![line(999, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemNotFound);
    }

    #[tokio::test]
    async fn pos_override_needs_permission_and_open_session() {
        let state = seeded().await;
        let staff = test_support::user(2, "staff", Some(1));
        let mut cheap = line(10, 1);
        cheap.unit_price = Some(200.0);

        let err = state
            .orders
            .create(&staff, create_input(OrderType::Takeaway, OrderSource::Pos, vec![cheap.clone()]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);

        let session = state
            .pos
            .open(
                &staff,
                &PosSessionOpen {
                    branch_id: 1,
                    terminal_id: "T1".into(),
                    opening_cash: None,
                },
            )
            .await
            .unwrap();
        let order = state
            .orders
            .create(&staff, create_input(OrderType::Takeaway, OrderSource::Pos, vec![cheap.clone()]))
            .await
            .unwrap();
        assert_eq!(order.subtotal, 200.0);
        assert_eq!(order.pos_session_id, Some(session.id));
        assert_eq!(order.payment_status, PaymentStatus::Pending);

        let mut restricted = test_support::user(3, "staff", Some(1));
        restricted.permissions.clear();
        let err = state
            .orders
            .create(&restricted, create_input(OrderType::Takeaway, OrderSource::Pos, vec![cheap]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn delivery_order_includes_charge_in_total() {
        let state = seeded().await;
        let customer = test_support::user(50, "customer", None);
        let mut input = create_input(OrderType::Delivery, OrderSource::Online, vec![line(10, 2)]);
        input.payment_method = PaymentMethod::Card;
        input.delivery_address = Some("House 4, Street 9".into());
        input.delivery_distance = Some(3.0);

        let order = state.orders.create(&customer, input).await.unwrap();
        assert_eq!(order.customer_id, Some(50));
        assert_eq!(order.subtotal, 500.0);
        assert_eq!(order.delivery_charge, 160.0);
        assert_eq!(order.delivery_distance, Some(3.0));
        assert_eq!(order.total, 660.0);
        assert_eq!(order.payment_status, PaymentStatus::Pending);

        let jobs = side_effect::find_by_order(&state.pool, order.id).await.unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn discount_keeps_totals_consistent() {
        let state = seeded().await;
        let manager = test_support::user(4, "manager", Some(1));
        let order = state
            .orders
            .create(&manager, create_input(OrderType::Takeaway, OrderSource::Phone, vec![line(11, 2)]))
            .await
            .unwrap();
        assert_eq!(order.subtotal, 199.0);

        let discount = |amount: f64| DiscountApply {
            amount,
            reason: Some("regular".into()),
        };

        let err = state
            .orders
            .apply_discount(&manager, order.id, &discount(199.01))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDiscount);
        let err = state
            .orders
            .apply_discount(&manager, order.id, &discount(-1.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDiscount);

        let zero = state.orders.apply_discount(&manager, order.id, &discount(0.0)).await.unwrap();
        assert_eq!(zero.total, order.total);

        let discounted = state
            .orders
            .apply_discount(&manager, order.id, &discount(49.0))
            .await
            .unwrap();
        assert_eq!(discounted.total, 150.0);
        assert_eq!(discounted.status, OrderStatus::Pending);

        let stored = state.orders.get(&manager, order.id).await.unwrap();
        assert_eq!(stored.total, stored.subtotal - stored.discount + stored.delivery_charge);

        // staff lack the discount permission by default
        let staff = test_support::user(2, "staff", Some(1));
        let err = state
            .orders
            .apply_discount(&staff, order.id, &discount(1.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn status_transitions_are_monotonic_and_publish() {
        let state = seeded().await;
        let staff = test_support::user(2, "staff", Some(1));
        let mut input = create_input(OrderType::DineIn, OrderSource::Phone, vec![line(10, 1)]);
        input.customer_id = Some(77);
        input.table_id = Some(3);
        let order = state.orders.create(&staff, input).await.unwrap();

        let mut customer_feed = state.bus.subscribe(vec![Scope::user(77)]);
        let mut branch_feed = state.bus.subscribe(vec![Scope::branch(1)]);

        let err = state
            .orders
            .transition_status(&staff, order.id, "shipped")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusValue);
        let err = state
            .orders
            .transition_status(&staff, 424242, "ready")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);

        let ready = state.orders.transition_status(&staff, order.id, "ready").await.unwrap();
        assert_eq!(ready.status, OrderStatus::Ready);
        let err = state
            .orders
            .transition_status(&staff, order.id, "preparing")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

        let done = state.orders.transition_status(&staff, order.id, "completed").await.unwrap();
        assert!(done.completed_at.is_some());

        let frame = customer_feed.try_recv().unwrap();
        assert!(frame.contains("order.statusUpdated"));
        // ready, completed, then the table is freed
        let mut branch_frames = Vec::new();
        while let Some(frame) = branch_feed.try_recv() {
            branch_frames.push(frame);
        }
        assert_eq!(branch_frames.len(), 3);
        assert!(branch_frames[2].contains("table.statusUpdated"));
        assert!(branch_frames[2].contains("available"));
    }

    #[tokio::test]
    async fn cancelling_needs_void_permission() {
        let state = seeded().await;
        let staff = test_support::user(2, "staff", Some(1));
        let manager = test_support::user(3, "manager", Some(1));
        let order = state
            .orders
            .create(&staff, create_input(OrderType::Takeaway, OrderSource::Phone, vec![line(10, 1)]))
            .await
            .unwrap();

        let err = state
            .orders
            .transition_status(&staff, order.id, "cancelled")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let cancelled = state
            .orders
            .transition_status(&manager, order.id, "cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        let err = state
            .orders
            .transition_status(&manager, order.id, "completed")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn payment_machine_and_callback() {
        let state = seeded().await;
        let customer = test_support::user(50, "customer", None);
        let mut input = create_input(OrderType::Takeaway, OrderSource::Online, vec![line(11, 1)]);
        input.payment_method = PaymentMethod::Wallet;
        let order = state.orders.create(&customer, input).await.unwrap();

        let mut record = PaymentRecord {
            method: PaymentMethod::Wallet,
            status: PaymentStatus::AwaitingVerification,
            transaction_id: None,
            gateway_transaction_id: None,
            metadata: None,
        };
        let err = state
            .orders
            .record_payment(&customer, order.id, &record)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);

        record.transaction_id = Some("JC-1001".into());
        let awaiting = state.orders.record_payment(&customer, order.id, &record).await.unwrap();
        assert_eq!(awaiting.payment_status, PaymentStatus::AwaitingVerification);

        let mut payload = Map::new();
        payload.insert("msisdn".into(), Value::String("0300".into()));
        let paid = state
            .orders
            .payment_callback(&PaymentCallback {
                order_id: order.id,
                provider: "jazzcash".into(),
                method: PaymentMethod::Wallet,
                status: PaymentStatus::Paid,
                transaction_id: None,
                payload: Some(payload),
            })
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.payment_metadata["transaction_id"], "JC-1001");
        assert_eq!(paid.payment_metadata["provider"], "jazzcash");
        assert_eq!(paid.payment_metadata["msisdn"], "0300");

        record.status = PaymentStatus::Pending;
        let manager = test_support::user(4, "manager", Some(1));
        let err = state
            .orders
            .record_payment(&manager, order.id, &record)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);
    }
}
