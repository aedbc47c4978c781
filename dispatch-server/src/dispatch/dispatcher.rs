use std::fmt;

use shared::message::{EventName, RiderLocationPayload, Scope};
use shared::models::{
    Delivery, DeliveryAssign, DeliveryStatus, DeliveryStatusUpdate, Order, OrderType, Rider,
    RiderCreate, RiderLocation, RiderLocationUpdate, RiderStatus,
};
use shared::util::{minutes_between, now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::auth::permissions::{DELIVERIES_DISPATCH, RIDERS_MANAGE, ROLE_ADMIN, ROLE_STAFF};
use crate::auth::{AccessPolicy, CurrentUser};
use crate::db::repository::delivery::StatusStamp;
use crate::db::repository::{RepoError, branch, delivery, order, rider};
use crate::orders::is_terminal;
use crate::realtime::RealtimeBus;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_coordinates, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Default and maximum points returned for a location trail
const DEFAULT_TRAIL_LIMIT: i64 = 500;
const MAX_TRAIL_LIMIT: i64 = 5000;

const fn rank(status: DeliveryStatus) -> u8 {
    match status {
        DeliveryStatus::Assigned => 0,
        DeliveryStatus::Accepted => 1,
        DeliveryStatus::PickedUp => 2,
        DeliveryStatus::Delivered => 3,
        DeliveryStatus::Cancelled => 4,
    }
}

fn is_final(status: DeliveryStatus) -> bool {
    matches!(status, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
}

/// Monotonic: forward only, cancel from any live state, terminal frozen
pub fn can_advance(from: DeliveryStatus, to: DeliveryStatus) -> bool {
    if is_final(from) || from == to {
        return false;
    }
    to == DeliveryStatus::Cancelled || rank(to) > rank(from)
}

#[derive(Clone)]
pub struct RiderDispatcher {
    pool: SqlitePool,
    bus: RealtimeBus,
}

impl fmt::Debug for RiderDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiderDispatcher").finish_non_exhaustive()
    }
}

impl RiderDispatcher {
    pub fn new(pool: SqlitePool, bus: RealtimeBus) -> Self {
        Self { pool, bus }
    }

    /// New riders start offline and unavailable
    pub async fn register(&self, caller: &CurrentUser, input: &RiderCreate) -> AppResult<Rider> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::require_permission(caller, RIDERS_MANAGE)?;
        AccessPolicy::check_branch(caller, input.branch_id)?;
        validate_required_text(&input.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&input.phone, "phone", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&input.vehicle_type, "vehicle_type", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&input.vehicle_number, "vehicle_number", MAX_SHORT_TEXT_LEN)?;

        branch::find_by_id(&self.pool, input.branch_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::BranchNotFound, input.branch_id))?;

        let now = now_millis();
        let new_rider = Rider {
            id: snowflake_id(),
            branch_id: input.branch_id,
            user_id: input.user_id,
            name: input.name.trim().to_string(),
            phone: input.phone.clone(),
            vehicle_type: input.vehicle_type.clone(),
            vehicle_number: input.vehicle_number.clone(),
            is_active: true,
            is_available: false,
            status: RiderStatus::Offline,
            latitude: None,
            longitude: None,
            last_location_at: None,
            total_deliveries: 0,
            created_at: now,
            updated_at: now,
        };
        let created = match rider::insert(&self.pool, &new_rider).await {
            Ok(created) => created,
            Err(RepoError::Duplicate(_)) => {
                return Err(AppError::with_message(
                    ErrorCode::AlreadyExists,
                    format!("User {} is already registered as a rider", input.user_id),
                )
                .with_detail("user_id", input.user_id));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            rider_id = created.id,
            branch_id = created.branch_id,
            user_id = created.user_id,
            registered_by = caller.id,
            "Rider registered"
        );
        Ok(created)
    }

    /// Duty toggle by branch staff or the rider; `busy` belongs to dispatch
    pub async fn set_status(&self, caller: &CurrentUser, id: i64, status: &str) -> AppResult<Rider> {
        let to: RiderStatus = status.parse().map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidStatusValue,
                format!("Unknown rider status '{status}'"),
            )
            .with_detail("status", status)
        })?;
        if to == RiderStatus::Busy {
            return Err(AppError::validation("Riders become busy only through assignment")
                .with_detail("status", status));
        }

        let current = self.find_rider(id).await?;
        authorize_rider(caller, &current)?;
        if current.status == RiderStatus::Busy {
            return Err(rider_busy(&current));
        }
        if !rider::set_duty_status(&self.pool, id, to, now_millis()).await? {
            // claimed between the read and the write
            return Err(rider_busy(&current));
        }

        let updated = self.find_rider(id).await?;
        tracing::info!(rider_id = id, from = %current.status, to = %to, changed_by = caller.id, "Rider status updated");
        Ok(updated)
    }

    pub async fn get_available(&self, caller: &CurrentUser, branch_id: i64) -> AppResult<Vec<Rider>> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::check_branch(caller, branch_id)?;
        Ok(rider::find_available(&self.pool, branch_id).await?)
    }

    /// Hand a delivery order to a rider.
    ///
    /// Pre-checks give precise errors; the transaction re-checks the rider
    /// with a conditional claim and relies on the one-live-delivery index
    /// for the order.
    pub async fn assign(&self, caller: &CurrentUser, input: &DeliveryAssign) -> AppResult<Delivery> {
        AccessPolicy::require_operator(caller)?;
        AccessPolicy::require_permission(caller, DELIVERIES_DISPATCH)?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;

        let order = order::find_by_id(&self.pool, input.order_id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::OrderNotFound, input.order_id))?;
        AccessPolicy::check_branch(caller, order.branch_id)?;
        check_dispatchable(&order)?;

        let candidate = self.find_rider(input.rider_id).await?;
        if candidate.branch_id != order.branch_id {
            return Err(AppError::validation(format!(
                "Rider {} belongs to branch {}, order {} to branch {}",
                candidate.id, candidate.branch_id, order.id, order.branch_id
            ))
            .with_detail("rider_id", candidate.id));
        }
        if let Some(existing) = delivery::find_live_by_order(&self.pool, order.id).await? {
            return Err(already_assigned(order.id, Some(existing.id)));
        }
        if !candidate.is_active || !candidate.is_available {
            return Err(rider_unavailable(candidate.id));
        }

        let now = now_millis();
        let assigned = Delivery {
            id: snowflake_id(),
            order_id: order.id,
            rider_id: candidate.id,
            branch_id: order.branch_id,
            status: DeliveryStatus::Assigned,
            assigned_at: now,
            accepted_at: None,
            picked_up_at: None,
            delivered_at: None,
            cancelled_at: None,
            actual_duration_minutes: None,
            cancel_reason: None,
            notes: input.notes.clone(),
            updated_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        if !rider::claim(&mut *tx, candidate.id, now).await? {
            return Err(rider_unavailable(candidate.id));
        }
        match delivery::insert(&mut *tx, &assigned).await {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => return Err(already_assigned(order.id, None)),
            Err(e) => return Err(e.into()),
        }
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            delivery_id = assigned.id,
            order_id = order.id,
            rider_id = candidate.id,
            branch_id = order.branch_id,
            assigned_by = caller.id,
            "Delivery assigned"
        );
        self.publish_delivery(&assigned, candidate.user_id);
        Ok(assigned)
    }

    /// Advance a delivery; delivered and cancelled put the rider back online
    pub async fn update_status(
        &self,
        caller: &CurrentUser,
        id: i64,
        input: &DeliveryStatusUpdate,
    ) -> AppResult<Delivery> {
        let to: DeliveryStatus = input.status.parse().map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidStatusValue,
                format!("Unknown delivery status '{}'", input.status),
            )
            .with_detail("status", input.status.as_str())
        })?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
        validate_optional_text(&input.cancel_reason, "cancel_reason", MAX_NOTE_LEN)?;

        let current = self.find_delivery(id).await?;
        let carrier = self.find_rider(current.rider_id).await?;
        authorize_rider(caller, &carrier)?;
        if to == DeliveryStatus::Cancelled && !caller.is_branch_operator() {
            return Err(AppError::permission_denied("Only branch staff can cancel a delivery"));
        }
        if !can_advance(current.status, to) {
            return Err(invalid_transition(&current, to));
        }

        let now = now_millis();
        let stamp = StatusStamp {
            actual_duration_minutes: (to == DeliveryStatus::Delivered)
                .then(|| minutes_between(current.assigned_at, now)),
            cancel_reason: input
                .cancel_reason
                .as_deref()
                .filter(|_| to == DeliveryStatus::Cancelled),
            notes: input.notes.as_deref(),
        };

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        if !delivery::update_status(&mut *tx, id, current.status, to, stamp, now).await? {
            drop(tx);
            let fresh = self.find_delivery(id).await?;
            return Err(invalid_transition(&fresh, to));
        }
        if is_final(to) {
            rider::release(&mut *tx, current.rider_id, to == DeliveryStatus::Delivered, now).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        let updated = self.find_delivery(id).await?;
        tracing::info!(
            delivery_id = id,
            order_id = updated.order_id,
            rider_id = updated.rider_id,
            from = %current.status,
            to = %to,
            duration_minutes = ?updated.actual_duration_minutes,
            "Delivery status updated"
        );
        self.publish_delivery(&updated, carrier.user_id);
        Ok(updated)
    }

    pub async fn get(&self, caller: &CurrentUser, id: i64) -> AppResult<Delivery> {
        let found = self.find_delivery(id).await?;
        let carrier = self.find_rider(found.rider_id).await?;
        authorize_rider(caller, &carrier)?;
        Ok(found)
    }

    /// Location ping: live coordinates plus one history row
    pub async fn record_location(
        &self,
        caller: &CurrentUser,
        rider_id: i64,
        input: &RiderLocationUpdate,
    ) -> AppResult<RiderLocation> {
        validate_coordinates(input.latitude, input.longitude)?;
        for (field, value) in [("accuracy", input.accuracy), ("speed", input.speed), ("heading", input.heading)] {
            if let Some(v) = value
                && (!v.is_finite() || v < 0.0)
            {
                return Err(AppError::validation(format!("{field} must be a non-negative number"))
                    .with_detail("field", field));
            }
        }

        let current = self.find_rider(rider_id).await?;
        authorize_rider(caller, &current)?;
        let active = delivery::find_active_by_rider(&self.pool, rider_id).await?;

        let now = now_millis();
        let location = RiderLocation {
            id: snowflake_id(),
            rider_id,
            delivery_id: active.map(|d| d.id),
            latitude: input.latitude,
            longitude: input.longitude,
            accuracy: input.accuracy,
            speed: input.speed,
            heading: input.heading,
            recorded_at: now,
        };
        if !rider::update_position(&self.pool, rider_id, input.latitude, input.longitude, now).await? {
            return Err(AppError::entity_not_found(ErrorCode::RiderNotFound, rider_id));
        }
        rider::insert_location(&self.pool, &location).await?;

        tracing::debug!(rider_id, delivery_id = ?location.delivery_id, "Rider location recorded");
        self.bus.emit(
            EventName::RiderLocationUpdated,
            &RiderLocationPayload {
                rider_id,
                branch_id: current.branch_id,
                delivery_id: location.delivery_id,
                latitude: location.latitude,
                longitude: location.longitude,
                recorded_at: now,
            },
            &[Scope::role(ROLE_ADMIN), Scope::role(ROLE_STAFF)],
        );
        Ok(location)
    }

    /// Location history, oldest first, most recent `limit` points
    pub async fn location_trail(
        &self,
        caller: &CurrentUser,
        rider_id: i64,
        since: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Vec<RiderLocation>> {
        let current = self.find_rider(rider_id).await?;
        authorize_rider(caller, &current)?;
        let limit = limit.unwrap_or(DEFAULT_TRAIL_LIMIT).clamp(1, MAX_TRAIL_LIMIT);
        Ok(rider::find_locations(&self.pool, rider_id, since, limit).await?)
    }

    async fn find_rider(&self, id: i64) -> AppResult<Rider> {
        rider::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::RiderNotFound, id))
    }

    async fn find_delivery(&self, id: i64) -> AppResult<Delivery> {
        delivery::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(ErrorCode::DeliveryNotFound, id))
    }

    fn publish_delivery(&self, delivery: &Delivery, rider_user_id: i64) {
        self.bus.emit(
            EventName::DeliveryStatusUpdated,
            delivery,
            &[
                Scope::role(ROLE_ADMIN),
                Scope::role(ROLE_STAFF),
                Scope::user(rider_user_id),
            ],
        );
    }
}

/// The rider themself, or an operator of the rider's branch
fn authorize_rider(caller: &CurrentUser, subject: &Rider) -> AppResult<()> {
    if caller.is_rider() {
        if caller.id == subject.user_id {
            return Ok(());
        }
        return Err(AppError::permission_denied("Riders can only act on their own record"));
    }
    AccessPolicy::require_operator(caller)?;
    AccessPolicy::check_branch(caller, subject.branch_id)
}

fn check_dispatchable(order: &Order) -> AppResult<()> {
    if order.order_type != OrderType::Delivery {
        return Err(AppError::validation(format!(
            "Order {} is a {} order, not a delivery",
            order.id, order.order_type
        ))
        .with_detail("order_id", order.id));
    }
    if is_terminal(order.status) {
        return Err(AppError::validation(format!(
            "Order {} is {} and cannot be dispatched",
            order.id, order.status
        ))
        .with_detail("order_id", order.id));
    }
    Ok(())
}

fn rider_unavailable(rider_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::RiderUnavailable,
        format!("Rider {rider_id} is not available for assignment"),
    )
    .with_detail("rider_id", rider_id)
}

fn rider_busy(subject: &Rider) -> AppError {
    AppError::with_message(
        ErrorCode::RiderBusy,
        format!("Rider {} is on a delivery", subject.id),
    )
    .with_detail("rider_id", subject.id)
}

fn already_assigned(order_id: i64, delivery_id: Option<i64>) -> AppError {
    let err = AppError::with_message(
        ErrorCode::DeliveryAlreadyAssigned,
        format!("Order {order_id} already has a delivery in progress"),
    )
    .with_detail("order_id", order_id);
    match delivery_id {
        Some(id) => err.with_detail("delivery_id", id),
        None => err,
    }
}

fn invalid_transition(current: &Delivery, to: DeliveryStatus) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidDeliveryTransition,
        format!("Delivery {} cannot move from {} to {}", current.id, current.status, to),
    )
    .with_detail("from", current.status.as_str())
    .with_detail("to", to.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ServerState;
    use crate::test_support;
    use shared::models::{OrderCreate, OrderItemInput, OrderSource, PaymentMethod};

    #[test]
    fn delivery_statuses_are_monotonic() {
        use DeliveryStatus::*;
        assert!(can_advance(Assigned, Accepted));
        assert!(can_advance(Accepted, PickedUp));
        assert!(can_advance(PickedUp, Delivered));
        assert!(can_advance(PickedUp, Cancelled));
        assert!(!can_advance(PickedUp, Accepted));
        assert!(!can_advance(Delivered, Cancelled));
        assert!(!can_advance(Cancelled, Assigned));
    }

    struct Fixture {
        state: ServerState,
        manager: CurrentUser,
    }

    async fn fixture() -> Fixture {
        let state = test_support::state().await;
        test_support::seed_branch(&state.pool, 1, None).await;
        test_support::seed_branch(&state.pool, 2, None).await;
        test_support::seed_menu_item(&state.pool, 10, 300.0).await;
        Fixture {
            state,
            manager: test_support::user(4, "manager", Some(1)),
        }
    }

    impl Fixture {
        async fn online_rider(&self, user_id: i64) -> Rider {
            let created = self
                .state
                .dispatcher
                .register(
                    &self.manager,
                    &RiderCreate {
                        branch_id: 1,
                        user_id,
                        name: format!("Rider {user_id}"),
                        phone: None,
                        vehicle_type: Some("bike".into()),
                        vehicle_number: None,
                    },
                )
                .await
                .unwrap();
            self.state
                .dispatcher
                .set_status(&self.manager, created.id, "online")
                .await
                .unwrap()
        }

        async fn delivery_order(&self) -> Order {
            self.state
                .orders
                .create(
                    &self.manager,
                    OrderCreate {
                        branch_id: 1,
                        customer_id: Some(900),
                        order_type: OrderType::Delivery,
                        source: OrderSource::Phone,
                        items: vec![OrderItemInput {
                            menu_item_id: 10,
                            quantity: 1,
                            variant_ids: vec![],
                            unit_price: None,
                            notes: None,
                        }],
                        payment_method: PaymentMethod::Cash,
                        table_id: None,
                        delivery_address: Some("Block 5".into()),
                        delivery_distance: Some(2.0),
                        notes: None,
                    },
                )
                .await
                .unwrap()
        }

        async fn assign(&self, order_id: i64, rider_id: i64) -> AppResult<Delivery> {
            self.state
                .dispatcher
                .assign(
                    &self.manager,
                    &DeliveryAssign {
                        order_id,
                        rider_id,
                        notes: None,
                    },
                )
                .await
        }

        async fn advance(&self, caller: &CurrentUser, id: i64, status: &str) -> AppResult<Delivery> {
            self.state
                .dispatcher
                .update_status(
                    caller,
                    id,
                    &DeliveryStatusUpdate {
                        status: status.into(),
                        notes: None,
                        cancel_reason: None,
                    },
                )
                .await
        }
    }

    #[tokio::test]
    async fn registered_riders_start_offline() {
        let f = fixture().await;
        let input = RiderCreate {
            branch_id: 1,
            user_id: 300,
            name: "Asad".into(),
            phone: Some("0300".into()),
            vehicle_type: None,
            vehicle_number: None,
        };
        let created = f.state.dispatcher.register(&f.manager, &input).await.unwrap();
        assert_eq!(created.status, RiderStatus::Offline);
        assert!(!created.is_available);
        assert!(f.state.dispatcher.get_available(&f.manager, 1).await.unwrap().is_empty());

        let err = f.state.dispatcher.register(&f.manager, &input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);

        let err = f
            .state
            .dispatcher
            .set_status(&f.manager, created.id, "busy")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn assign_flips_rider_and_rejects_second_assignment() {
        let f = fixture().await;
        let first = f.online_rider(301).await;
        let second = f.online_rider(302).await;
        let order = f.delivery_order().await;

        let assigned = f.assign(order.id, first.id).await.unwrap();
        assert_eq!(assigned.status, DeliveryStatus::Assigned);

        let rider = rider::find_by_id(&f.state.pool, first.id).await.unwrap().unwrap();
        assert!(!rider.is_available);
        assert_eq!(rider.status, RiderStatus::Busy);

        let err = f.assign(order.id, second.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DeliveryAlreadyAssigned);

        let other = f.delivery_order().await;
        let err = f.assign(other.id, first.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RiderUnavailable);
        assert!(err.message.contains(&first.id.to_string()));

        let err = f
            .state
            .dispatcher
            .set_status(&f.manager, first.id, "offline")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RiderBusy);
    }

    #[tokio::test]
    async fn delivered_releases_rider_and_freezes_delivery() {
        let f = fixture().await;
        let courier = f.online_rider(303).await;
        let order = f.delivery_order().await;
        let assigned = f.assign(order.id, courier.id).await.unwrap();

        let rider_user = test_support::user(303, "rider", Some(1));
        let mut feed = f.state.bus.subscribe(vec![Scope::user(303)]);

        f.advance(&rider_user, assigned.id, "accepted").await.unwrap();
        let err = f.advance(&rider_user, assigned.id, "assigned").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDeliveryTransition);
        f.advance(&rider_user, assigned.id, "picked_up").await.unwrap();
        let done = f.advance(&rider_user, assigned.id, "delivered").await.unwrap();

        assert!(done.accepted_at.is_some());
        assert!(done.picked_up_at.is_some());
        assert!(done.delivered_at.is_some());
        assert_eq!(done.actual_duration_minutes, Some(0));

        let err = f.advance(&f.manager, assigned.id, "cancelled").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDeliveryTransition);

        let rider = rider::find_by_id(&f.state.pool, courier.id).await.unwrap().unwrap();
        assert!(rider.is_available);
        assert_eq!(rider.status, RiderStatus::Online);
        assert_eq!(rider.total_deliveries, 1);

        let mut frames = 0;
        while feed.try_recv().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 3);
    }

    #[tokio::test]
    async fn cancellation_releases_without_counting() {
        let f = fixture().await;
        let courier = f.online_rider(304).await;
        let order = f.delivery_order().await;
        let assigned = f.assign(order.id, courier.id).await.unwrap();

        let rider_user = test_support::user(304, "rider", Some(1));
        let err = f.advance(&rider_user, assigned.id, "cancelled").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let cancelled = f.advance(&f.manager, assigned.id, "cancelled").await.unwrap();
        assert!(cancelled.cancelled_at.is_some());

        let rider = rider::find_by_id(&f.state.pool, courier.id).await.unwrap().unwrap();
        assert!(rider.is_available);
        assert_eq!(rider.total_deliveries, 0);

        // the order can be dispatched again
        f.assign(order.id, courier.id).await.unwrap();
    }

    #[tokio::test]
    async fn location_pings_build_a_trail() {
        let f = fixture().await;
        let courier = f.online_rider(305).await;
        let rider_user = test_support::user(305, "rider", Some(1));
        let mut staff_feed = f.state.bus.subscribe(vec![Scope::role("staff")]);

        for (lat, lon) in [(24.80, 67.01), (24.81, 67.02), (24.82, 67.03)] {
            f.state
                .dispatcher
                .record_location(
                    &rider_user,
                    courier.id,
                    &RiderLocationUpdate {
                        latitude: lat,
                        longitude: lon,
                        accuracy: Some(5.0),
                        speed: None,
                        heading: None,
                    },
                )
                .await
                .unwrap();
        }

        let trail = f
            .state
            .dispatcher
            .location_trail(&f.manager, courier.id, None, Some(2))
            .await
            .unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1].latitude, 24.82);

        let rider = rider::find_by_id(&f.state.pool, courier.id).await.unwrap().unwrap();
        assert_eq!(rider.latitude, Some(24.82));
        assert!(staff_feed.try_recv().unwrap().contains("rider.locationUpdated"));

        let other = test_support::user(999, "rider", Some(1));
        let err = f
            .state
            .dispatcher
            .location_trail(&other, courier.id, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = f
            .state
            .dispatcher
            .record_location(
                &rider_user,
                courier.id,
                &RiderLocationUpdate {
                    latitude: 91.0,
                    longitude: 0.0,
                    accuracy: None,
                    speed: None,
                    heading: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
