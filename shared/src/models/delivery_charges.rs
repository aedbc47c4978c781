//! Delivery Charges Model

use serde::{Deserialize, Serialize};

/// How a branch prices delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ChargeType {
    Static,
    DistanceBased,
}

impl_str_enum!(ChargeType, "charge type", {
    Static => "static",
    DistanceBased => "distance_based",
});

/// Per-branch delivery pricing configuration (admin-managed)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryChargesConfig {
    pub id: i64,
    pub branch_id: i64,
    pub charge_type: ChargeType,
    #[serde(with = "crate::money::amount")]
    pub static_charge: f64,
    #[serde(with = "crate::money::amount")]
    pub base_charge: f64,
    #[serde(with = "crate::money::amount")]
    pub per_km_charge: f64,
    /// Orders at or above this amount deliver free; None disables
    #[serde(with = "crate::money::option_amount")]
    pub free_delivery_threshold: Option<f64>,
    /// Max serviceable distance in km
    pub max_delivery_distance: f64,
    pub is_active: bool,
    pub updated_at: i64,
}

/// `POST /api/delivery-charges/calculate` request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryChargeRequest {
    pub branch_id: i64,
    #[serde(with = "crate::money::amount")]
    pub order_amount: f64,
    /// Distance in km, skips geocoding when present
    pub distance: Option<f64>,
    pub delivery_address: Option<String>,
}

/// Calculated delivery charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryChargeQuote {
    #[serde(with = "crate::money::amount")]
    pub delivery_charges: f64,
    pub charge_type: ChargeType,
    pub free_delivery: bool,
    /// Distance in km actually used, if any was resolved
    pub distance: Option<f64>,
    /// True when a branch-specific active config was applied
    pub using_custom_config: bool,
    /// Whole minutes
    pub estimated_delivery_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}
