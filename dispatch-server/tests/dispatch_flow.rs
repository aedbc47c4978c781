//! End-to-end flows through the public component API and the HTTP router

use std::sync::Arc;

use axum::body::Body;
use dispatch_server::auth::permissions::get_default_permissions;
use dispatch_server::core::{Config, ServerState, build_app};
use dispatch_server::db::DbService;
use dispatch_server::db::repository::{branch, delivery, delivery_charges, menu_item, rider};
use dispatch_server::pricing::StaticGeocoder;
use dispatch_server::{CurrentUser, ErrorCode};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use shared::models::{
    Branch, ChargeType, DeliveryAssign, DeliveryChargeRequest, DeliveryChargesConfig,
    DeliveryStatus, DeliveryStatusUpdate, DiscountApply, MenuItem, OrderCreate, OrderItemInput,
    OrderSource, OrderType, PaymentMethod, PosSessionClose, PosSessionOpen, PosSessionStatus,
    RiderCreate,
};
use shared::util::now_millis;
use tower::ServiceExt;

const BRANCH: i64 = 1;
const MENU_ITEM: i64 = 50;

async fn setup() -> ServerState {
    let db = DbService::in_memory().await.unwrap();
    let state = ServerState::with_pool(
        Config::for_tests(),
        db.pool,
        Arc::new(StaticGeocoder::new()),
    );

    branch::upsert(
        &state.pool,
        &Branch {
            id: BRANCH,
            name: "Gulshan".into(),
            address: None,
            latitude: Some(24.92),
            longitude: Some(67.09),
            is_active: true,
        },
    )
    .await
    .unwrap();
    menu_item::upsert(
        &state.pool,
        &MenuItem {
            id: MENU_ITEM,
            name: "Family platter".into(),
            price: 1000.0,
            is_available: true,
        },
    )
    .await
    .unwrap();
    state
}

async fn seed_charges(state: &ServerState, static_charge: f64, free_threshold: Option<f64>) {
    delivery_charges::upsert(
        &state.pool,
        &DeliveryChargesConfig {
            id: 1,
            branch_id: BRANCH,
            charge_type: ChargeType::Static,
            static_charge,
            base_charge: static_charge,
            per_km_charge: 0.0,
            free_delivery_threshold: free_threshold,
            max_delivery_distance: 10.0,
            is_active: true,
            updated_at: now_millis(),
        },
    )
    .await
    .unwrap();
}

fn user(id: i64, role: &str) -> CurrentUser {
    CurrentUser {
        id,
        username: format!("{role}{id}"),
        role: role.to_string(),
        branch_id: Some(BRANCH),
        permissions: get_default_permissions(role),
    }
}

fn delivery_order() -> OrderCreate {
    OrderCreate {
        branch_id: BRANCH,
        customer_id: None,
        order_type: OrderType::Delivery,
        source: OrderSource::Phone,
        items: vec![OrderItemInput {
            menu_item_id: MENU_ITEM,
            quantity: 1,
            variant_ids: vec![],
            unit_price: None,
            notes: None,
        }],
        payment_method: PaymentMethod::Cash,
        table_id: None,
        delivery_address: Some("House 12, Block 7".into()),
        delivery_distance: Some(3.0),
        notes: None,
    }
}

async fn online_rider(state: &ServerState, manager: &CurrentUser, user_id: i64) -> i64 {
    let created = state
        .dispatcher
        .register(
            manager,
            &RiderCreate {
                branch_id: BRANCH,
                user_id,
                name: format!("Rider {user_id}"),
                phone: None,
                vehicle_type: Some("motorbike".into()),
                vehicle_number: None,
            },
        )
        .await
        .unwrap();
    state
        .dispatcher
        .set_status(manager, created.id, "online")
        .await
        .unwrap();
    created.id
}

fn status(value: &str) -> DeliveryStatusUpdate {
    DeliveryStatusUpdate {
        status: value.into(),
        notes: None,
        cancel_reason: None,
    }
}

#[tokio::test]
async fn scenario_a_delivery_order_round_trip() {
    let state = setup().await;
    seed_charges(&state, 100.0, None).await;
    let manager = user(2, "manager");

    let order = state.orders.create(&manager, delivery_order()).await.unwrap();
    assert_eq!(order.subtotal, 1000.0);
    assert_eq!(order.delivery_charge, 100.0);
    assert_eq!(order.total, 1100.0);

    let discounted = state
        .orders
        .apply_discount(
            &manager,
            order.id,
            &DiscountApply {
                amount: 0.0,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(discounted.total, 1100.0);

    let rider_id = online_rider(&state, &manager, 700).await;
    let assigned = state
        .dispatcher
        .assign(
            &manager,
            &DeliveryAssign {
                order_id: order.id,
                rider_id,
                notes: None,
            },
        )
        .await
        .unwrap();
    let busy = rider::find_by_id(&state.pool, rider_id).await.unwrap().unwrap();
    assert!(!busy.is_available);

    let courier = user(700, "rider");
    for next in ["accepted", "picked_up", "delivered"] {
        state
            .dispatcher
            .update_status(&courier, assigned.id, &status(next))
            .await
            .unwrap();
    }

    let done = delivery::find_by_id(&state.pool, assigned.id).await.unwrap().unwrap();
    assert_eq!(done.status, DeliveryStatus::Delivered);
    let released = rider::find_by_id(&state.pool, rider_id).await.unwrap().unwrap();
    assert!(released.is_available);
    assert_eq!(released.total_deliveries, busy.total_deliveries + 1);
}

#[tokio::test]
async fn scenario_b_free_delivery_over_threshold() {
    let state = setup().await;
    seed_charges(&state, 100.0, Some(1500.0)).await;

    for distance in [None, Some(2.0), Some(10.0)] {
        let quote = state
            .pricing
            .compute_delivery_charge(&DeliveryChargeRequest {
                branch_id: BRANCH,
                order_amount: 2000.0,
                distance,
                delivery_address: None,
            })
            .await
            .unwrap();
        assert_eq!(quote.delivery_charges, 0.0);
        assert!(quote.free_delivery);
    }

    let err = state
        .pricing
        .compute_delivery_charge(&DeliveryChargeRequest {
            branch_id: BRANCH,
            order_amount: 2000.0,
            distance: Some(250.0),
            delivery_address: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DeliveryOutOfRange);
}

#[tokio::test]
async fn scenario_c_session_closes_once() {
    let state = setup().await;
    let staff = user(3, "staff");

    let session = state
        .pos
        .open(
            &staff,
            &PosSessionOpen {
                branch_id: BRANCH,
                terminal_id: "T1".into(),
                opening_cash: Some(200.0),
            },
        )
        .await
        .unwrap();

    let close = PosSessionClose {
        closing_cash: Some(json!(500)),
        notes: None,
    };
    let closed = state.pos.close(&staff, session.id, &close).await.unwrap();
    assert_eq!(closed.status, PosSessionStatus::Closed);
    assert_eq!(closed.closing_cash, Some(500.0));

    let err = state.pos.close(&staff, session.id, &close).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SessionAlreadyClosed);
    assert!(state.pos.get_active(&staff, BRANCH).await.unwrap().is_none());
}

#[tokio::test]
async fn scenario_d_concurrent_assignment_has_one_winner() {
    let state = setup().await;
    seed_charges(&state, 100.0, None).await;
    let manager = user(2, "manager");
    let staff = user(3, "staff");

    let first = state.orders.create(&manager, delivery_order()).await.unwrap();
    let second = state.orders.create(&manager, delivery_order()).await.unwrap();
    let rider_id = online_rider(&state, &manager, 701).await;

    let assign_first = DeliveryAssign {
        order_id: first.id,
        rider_id,
        notes: None,
    };
    let assign_second = DeliveryAssign {
        order_id: second.id,
        rider_id,
        notes: None,
    };
    let (a, b) = tokio::join!(
        state.dispatcher.assign(&manager, &assign_first),
        state.dispatcher.assign(&staff, &assign_second),
    );

    let outcomes = [a, b];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    let loser = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(loser.code, ErrorCode::RiderUnavailable);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM delivery WHERE rider_id = ? AND status IN ('assigned', 'accepted', 'picked_up')",
    )
    .bind(rider_id)
    .fetch_one(&state.pool)
    .await
    .unwrap();
    assert_eq!(active, 1);
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn http_quote_uses_camel_case_and_string_money() {
    let state = setup().await;
    seed_charges(&state, 100.0, Some(1500.0)).await;
    let token = state
        .get_jwt_service()
        .generate_token(2, "manager2", "manager", Some(BRANCH), &[])
        .unwrap();
    let app = build_app(state);

    let body = json!({ "branchId": BRANCH, "orderAmount": "2000", "distance": 4 });
    let unauthenticated = app
        .clone()
        .oneshot(
            Request::post("/api/delivery-charges/calculate")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::post("/api/delivery-charges/calculate")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let quote = read_json(response).await;
    assert_eq!(quote["deliveryCharges"], "0.00");
    assert_eq!(quote["freeDelivery"], true);
    assert_eq!(quote["usingCustomConfig"], true);
}

#[tokio::test]
async fn http_errors_carry_code_and_status() {
    let state = setup().await;
    let token = state
        .get_jwt_service()
        .generate_token(3, "staff3", "staff", Some(BRANCH), &[])
        .unwrap();
    let app = build_app(state);

    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(read_json(health).await["status"], "healthy");

    let missing = app
        .oneshot(
            Request::get("/api/orders/424242")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = read_json(missing).await;
    assert_eq!(body["code"], ErrorCode::OrderNotFound.code());
}

#[tokio::test]
async fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dispatch.db");
    let path = path.to_string_lossy();

    let db = DbService::new(&path).await.unwrap();
    branch::upsert(
        &db.pool,
        &Branch {
            id: 9,
            name: "Clifton".into(),
            address: Some("Sea view".into()),
            latitude: None,
            longitude: None,
            is_active: true,
        },
    )
    .await
    .unwrap();
    db.pool.close().await;

    let reopened = DbService::new(&path).await.unwrap();
    let found = branch::find_by_id(&reopened.pool, 9).await.unwrap().unwrap();
    assert_eq!(found.name, "Clifton");
}
