//! Order Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

impl_str_enum!(OrderType, "order type", {
    DineIn => "dine_in",
    Takeaway => "takeaway",
    Delivery => "delivery",
});

/// Where the order was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderSource {
    Online,
    Pos,
    Phone,
}

impl_str_enum!(OrderSource, "order source", {
    Online => "online",
    Pos => "pos",
    Phone => "phone",
});

/// Order status
///
/// `pending → preparing → ready → completed`, `cancelled` from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl_str_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Preparing => "preparing",
    Ready => "ready",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentMethod {
    Cash,
    Card,
    Wallet,
}

impl_str_enum!(PaymentMethod, "payment method", {
    Cash => "cash",
    Card => "card",
    Wallet => "wallet",
});

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentStatus {
    Pending,
    AwaitingVerification,
    Paid,
    Failed,
    Refunded,
}

impl_str_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    AwaitingVerification => "awaiting_verification",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

/// A variant chosen for a line item, priced at submission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSelection {
    pub variant_id: i64,
    pub name: String,
    #[serde(with = "crate::money::amount")]
    pub price_delta: f64,
}

/// Order line item (order_item table)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Position within the order, starting at 1
    pub line_no: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i64,
    /// Base price + variant deltas
    #[serde(with = "crate::money::amount")]
    pub unit_price: f64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub variants: Vec<VariantSelection>,
    #[serde(with = "crate::money::amount")]
    pub line_total: f64,
    pub notes: Option<String>,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub branch_id: i64,
    /// Customer user id (None for guest / walk-in)
    pub customer_id: Option<i64>,
    pub order_type: OrderType,
    pub source: OrderSource,
    #[serde(with = "crate::money::amount")]
    pub subtotal: f64,
    #[serde(with = "crate::money::amount")]
    pub discount: f64,
    pub discount_reason: Option<String>,
    #[serde(with = "crate::money::amount")]
    pub delivery_charge: f64,
    /// Distance in km used for the delivery charge
    pub delivery_distance: Option<f64>,
    pub delivery_address: Option<String>,
    #[serde(with = "crate::money::amount")]
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Gateway references, merged key-wise on every payment update
    #[cfg_attr(feature = "db", sqlx(json))]
    pub payment_metadata: Value,
    pub status: OrderStatus,
    pub table_id: Option<i64>,
    pub pos_session_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Line item input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub variant_ids: Vec<i64>,
    /// Unit price override, honoured for POS orders only
    #[serde(default, with = "crate::money::option_amount")]
    pub unit_price: Option<f64>,
    pub notes: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub branch_id: i64,
    pub customer_id: Option<i64>,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    pub table_id: Option<i64>,
    pub delivery_address: Option<String>,
    /// Pre-computed distance in km (skips geocoding)
    pub delivery_distance: Option<f64>,
    pub notes: Option<String>,
}

/// Apply discount payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountApply {
    #[serde(with = "crate::money::amount")]
    pub amount: f64,
    pub reason: Option<String>,
}

/// Status transition payload (raw string, validated by the lifecycle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
}

/// Record payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Wallet provider transaction id
    pub transaction_id: Option<String>,
    /// Card gateway transaction / charge id
    pub gateway_transaction_id: Option<String>,
    /// Additional gateway fields, merged into `payment_metadata`
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, Value>>,
}

/// Payment provider callback (minimal contract)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    pub order_id: i64,
    /// Provider name, kept in the metadata
    pub provider: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        assert!("picked".parse::<OrderStatus>().is_err());
        assert_eq!("ready".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert_eq!(
            "awaiting_verification".parse::<PaymentStatus>(),
            Ok(PaymentStatus::AwaitingVerification)
        );
        assert_eq!(OrderType::DineIn.to_string(), "dine_in");
    }

    #[test]
    fn order_create_accepts_string_prices() {
        let json = r#"{
            "branch_id": 1,
            "customer_id": null,
            "order_type": "takeaway",
            "source": "pos",
            "items": [{"menu_item_id": 5, "quantity": 2, "unit_price": "4.50"}],
            "payment_method": "cash",
            "table_id": null,
            "delivery_address": null,
            "delivery_distance": null,
            "notes": null
        }"#;
        let create: OrderCreate = serde_json::from_str(json).unwrap();
        assert_eq!(create.items[0].unit_price, Some(4.5));
        assert!(create.items[0].variant_ids.is_empty());
    }

    #[test]
    fn payment_callback_is_camel_case() {
        let json = r#"{"orderId": 9, "provider": "easypaisa", "method": "wallet",
            "status": "paid", "transactionId": "TX-1"}"#;
        let callback: PaymentCallback = serde_json::from_str(json).unwrap();
        assert_eq!(callback.order_id, 9);
        assert_eq!(callback.transaction_id.as_deref(), Some("TX-1"));
        assert!(callback.payload.is_none());
    }
}
