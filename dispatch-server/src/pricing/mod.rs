//! Delivery pricing
//!
//! - [`PricingEngine`] - delivery charge and ETA for a branch/order/distance
//! - [`Geocoder`] - address → coordinates collaborator ([`HttpGeocoder`] in
//!   production, [`StaticGeocoder`] for fixed address tables)
//! - [`geo`] - great-circle distance

mod engine;
pub mod geo;
mod geocoder;

pub use engine::{PricingDefaults, PricingEngine};
pub use geocoder::{Coordinates, GeocodeError, Geocoder, HttpGeocoder, StaticGeocoder};
