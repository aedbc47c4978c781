//! Inventory Models
//!
//! Stock is never stored: it is the sum of the transaction ledger.

use serde::{Deserialize, Serialize};

/// Inventory transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum InventoryTransactionType {
    Sale,
    Wastage,
    Restock,
    Adjustment,
}

impl_str_enum!(InventoryTransactionType, "inventory transaction type", {
    Sale => "sale",
    Wastage => "wastage",
    Restock => "restock",
    Adjustment => "adjustment",
});

/// Inventory ledger entry (signed quantity delta)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryTransaction {
    pub id: i64,
    pub branch_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub transaction_type: InventoryTransactionType,
    /// Originating order for `sale` entries
    pub order_id: Option<i64>,
    pub line_no: Option<i64>,
    pub actor_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Manual stock movement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransactionCreate {
    pub branch_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub transaction_type: InventoryTransactionType,
    pub notes: Option<String>,
}

/// Derived stock level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub branch_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
}
