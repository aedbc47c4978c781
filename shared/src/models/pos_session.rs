//! POS Session Model (cash-drawer session)

use serde::{Deserialize, Serialize};

/// POS session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PosSessionStatus {
    Open,
    Closed,
}

impl_str_enum!(PosSessionStatus, "session status", {
    Open => "open",
    Closed => "closed",
});

/// POS session record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PosSession {
    pub id: i64,
    pub branch_id: i64,
    pub terminal_id: String,
    /// Per-branch running session number
    pub session_number: i64,
    pub status: PosSessionStatus,
    #[serde(with = "crate::money::amount")]
    pub opening_cash: f64,
    #[serde(with = "crate::money::option_amount")]
    pub closing_cash: Option<f64>,
    pub opened_by: Option<i64>,
    pub closed_by: Option<i64>,
    pub notes: Option<String>,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
}

/// Open session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSessionOpen {
    pub branch_id: i64,
    pub terminal_id: String,
    /// Opening float (default 0)
    #[serde(default, with = "crate::money::option_amount")]
    pub opening_cash: Option<f64>,
}

/// Close session payload
///
/// `closing_cash` is kept as raw JSON so a missing or non-numeric value
/// surfaces as `InvalidAmount` rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSessionClose {
    #[serde(default)]
    pub closing_cash: Option<serde_json::Value>,
    pub notes: Option<String>,
}
