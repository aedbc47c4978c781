//! Fixtures shared by unit tests

use std::sync::Arc;

use shared::models::{Branch, ChargeType, DeliveryChargesConfig, MenuItem, MenuItemVariant};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::auth::permissions::get_default_permissions;
use crate::core::{Config, ServerState};
use crate::db::DbService;
use crate::db::repository::{branch, delivery_charges, menu_item};
use crate::pricing::StaticGeocoder;

pub async fn pool() -> SqlitePool {
    DbService::in_memory().await.unwrap().pool
}

/// Fresh state over an in-memory database with a stub geocoder
pub async fn state_with(geocoder: StaticGeocoder) -> ServerState {
    ServerState::with_pool(Config::for_tests(), pool().await, Arc::new(geocoder))
}

pub async fn state() -> ServerState {
    state_with(StaticGeocoder::new()).await
}

pub async fn seed_branch(pool: &SqlitePool, id: i64, coordinates: Option<(f64, f64)>) {
    branch::upsert(
        pool,
        &Branch {
            id,
            name: format!("Branch {id}"),
            address: None,
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
            is_active: true,
        },
    )
    .await
    .unwrap();
}

/// Active branch config; `charge` is both the static and the base charge
pub async fn seed_charges(
    pool: &SqlitePool,
    branch_id: i64,
    charge_type: ChargeType,
    charge: f64,
    free_delivery_threshold: Option<f64>,
    max_delivery_distance: f64,
) {
    delivery_charges::upsert(
        pool,
        &DeliveryChargesConfig {
            id: branch_id * 100,
            branch_id,
            charge_type,
            static_charge: charge,
            base_charge: charge,
            per_km_charge: 10.0,
            free_delivery_threshold,
            max_delivery_distance,
            is_active: true,
            updated_at: now_millis(),
        },
    )
    .await
    .unwrap();
}

pub async fn seed_menu_item(pool: &SqlitePool, id: i64, price: f64) {
    menu_item::upsert(
        pool,
        &MenuItem {
            id,
            name: format!("Item {id}"),
            price,
            is_available: true,
        },
    )
    .await
    .unwrap();
}

pub async fn seed_variant(pool: &SqlitePool, id: i64, menu_item_id: i64, price_delta: f64) {
    menu_item::upsert_variant(
        pool,
        &MenuItemVariant {
            id,
            menu_item_id,
            name: format!("Variant {id}"),
            price_delta,
        },
    )
    .await
    .unwrap();
}

/// Caller with the role's default permissions
pub fn user(id: i64, role: &str, branch_id: Option<i64>) -> CurrentUser {
    CurrentUser {
        id,
        username: format!("{role}{id}"),
        role: role.to_string(),
        branch_id,
        permissions: get_default_permissions(role),
    }
}
