//! HTTP routes
//!
//! - [`health`] - liveness and database probe
//! - [`orders`] - order lifecycle
//! - [`payments`] - payment gateway callback
//! - [`pos`] - POS sessions and kitchen tickets
//! - [`delivery_charges`] - delivery charge quotes
//! - [`deliveries`] - rider assignment and delivery progress
//! - [`riders`] - rider registry, duty status and location
//! - [`inventory`] - manual stock movements and stock levels
//! - [`loyalty`] - loyalty balance
//! - [`ws`] - real-time channel

use axum::Router;

use crate::core::ServerState;

pub mod deliveries;
pub mod delivery_charges;
pub mod health;
pub mod inventory;
pub mod loyalty;
pub mod orders;
pub mod payments;
pub mod pos;
pub mod riders;
pub mod ws;

/// Every route, state not yet applied
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(pos::router())
        .merge(delivery_charges::router())
        .merge(deliveries::router())
        .merge(riders::router())
        .merge(inventory::router())
        .merge(loyalty::router())
        .merge(ws::router())
}
