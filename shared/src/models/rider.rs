//! Rider Model

use serde::{Deserialize, Serialize};

/// Rider status
///
/// `busy` is owned by dispatch; staff toggle between the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum RiderStatus {
    Online,
    Busy,
    Offline,
    OnBreak,
}

impl_str_enum!(RiderStatus, "rider status", {
    Online => "online",
    Busy => "busy",
    Offline => "offline",
    OnBreak => "on_break",
});

/// Rider entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Rider {
    pub id: i64,
    pub branch_id: i64,
    /// Login account of the rider (target of `user:<id>` events)
    pub user_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    pub is_active: bool,
    pub is_available: bool,
    pub status: RiderStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_location_at: Option<i64>,
    pub total_deliveries: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Register rider payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderCreate {
    pub branch_id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
}

/// Staff availability toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderStatusUpdate {
    pub status: String,
}

/// Location ping payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderLocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
}

/// Append-only location history record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RiderLocation {
    pub id: i64,
    pub rider_id: i64,
    pub delivery_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub recorded_at: i64,
}
