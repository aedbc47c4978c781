//! Kitchen Ticket Model

use serde::{Deserialize, Serialize};

/// Kitchen ticket status: `queued → preparing → ready → served`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TicketStatus {
    Queued,
    Preparing,
    Ready,
    Served,
}

impl_str_enum!(TicketStatus, "ticket status", {
    Queued => "queued",
    Preparing => "preparing",
    Ready => "ready",
    Served => "served",
});

/// Item routed to the kitchen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketItem {
    pub line_no: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub variants: Vec<String>,
    pub notes: Option<String>,
}

/// Kitchen ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct KitchenTicket {
    pub id: i64,
    pub order_id: i64,
    pub branch_id: i64,
    /// Per-branch running ticket number
    pub ticket_number: i64,
    pub status: TicketStatus,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub items: Vec<TicketItem>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create ticket payload (reprint / modification)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenTicketCreate {
    pub order_id: i64,
    /// Subset of order line numbers; all lines when absent
    pub line_nos: Option<Vec<i64>>,
    pub notes: Option<String>,
}

/// Update ticket payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenTicketUpdate {
    pub status: String,
}
