//! Event payloads that are not plain entity snapshots

use serde::{Deserialize, Serialize};

use super::Scope;

/// `connection.ready`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReady {
    pub scopes: Vec<Scope>,
}

/// Dining table occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Occupied,
    Available,
}

/// `table.statusUpdated`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatusPayload {
    pub branch_id: i64,
    pub table_id: i64,
    pub status: TableStatus,
    pub order_id: i64,
}

/// `rider.locationUpdated`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderLocationPayload {
    pub rider_id: i64,
    pub branch_id: i64,
    pub delivery_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: i64,
}
