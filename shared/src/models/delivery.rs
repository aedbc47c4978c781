//! Delivery Model

use serde::{Deserialize, Serialize};

/// Delivery status
///
/// `assigned → accepted → picked_up → delivered`; `cancelled` from any of
/// the first three. `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DeliveryStatus {
    Assigned,
    Accepted,
    PickedUp,
    Delivered,
    Cancelled,
}

impl_str_enum!(DeliveryStatus, "delivery status", {
    Assigned => "assigned",
    Accepted => "accepted",
    PickedUp => "picked_up",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

/// Delivery assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Delivery {
    pub id: i64,
    pub order_id: i64,
    pub rider_id: i64,
    pub branch_id: i64,
    pub status: DeliveryStatus,
    pub assigned_at: i64,
    pub accepted_at: Option<i64>,
    pub picked_up_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    /// `delivered_at - assigned_at` in minutes
    pub actual_duration_minutes: Option<i64>,
    pub cancel_reason: Option<String>,
    pub notes: Option<String>,
    pub updated_at: i64,
}

/// Assign payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAssign {
    pub order_id: i64,
    pub rider_id: i64,
    pub notes: Option<String>,
}

/// Status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatusUpdate {
    pub status: String,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
}
