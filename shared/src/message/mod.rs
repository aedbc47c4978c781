//! Real-time message types
//!
//! Shared between dispatch-server and connected clients. Every server push
//! is a [`RealtimeEvent`] serialized as JSON text:
//!
//! ```json
//! { "event": "order.created", "data": { ... }, "timestamp": 1718000000000 }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod payload;
pub use payload::*;

/// Addressable fan-out scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// `branch:<id>`
    Branch(i64),
    /// `role:<name>`
    Role(String),
    /// `user:<id>`
    User(i64),
}

impl Scope {
    pub fn branch(id: i64) -> Self {
        Scope::Branch(id)
    }

    pub fn role(name: impl Into<String>) -> Self {
        Scope::Role(name.into())
    }

    pub fn user(id: i64) -> Self {
        Scope::User(id)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Branch(id) => write!(f, "branch:{id}"),
            Scope::Role(name) => write!(f, "role:{name}"),
            Scope::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid scope: {s}"))?;
        match kind {
            "branch" => value
                .parse()
                .map(Scope::Branch)
                .map_err(|_| format!("invalid branch id in scope: {s}")),
            "user" => value
                .parse()
                .map(Scope::User)
                .map_err(|_| format!("invalid user id in scope: {s}")),
            "role" if !value.is_empty() => Ok(Scope::Role(value.to_string())),
            _ => Err(format!("invalid scope: {s}")),
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Server-pushed event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// Sent once after the connection is authenticated and subscribed
    #[serde(rename = "connection.ready")]
    ConnectionReady,
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.statusUpdated")]
    OrderStatusUpdated,
    #[serde(rename = "kitchen.ticketCreated")]
    KitchenTicketCreated,
    #[serde(rename = "kitchen.ticketUpdated")]
    KitchenTicketUpdated,
    #[serde(rename = "rider.locationUpdated")]
    RiderLocationUpdated,
    #[serde(rename = "delivery.statusUpdated")]
    DeliveryStatusUpdated,
    #[serde(rename = "pos.sessionUpdated")]
    PosSessionUpdated,
    #[serde(rename = "table.statusUpdated")]
    TableStatusUpdated,
}

impl EventName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventName::ConnectionReady => "connection.ready",
            EventName::OrderCreated => "order.created",
            EventName::OrderStatusUpdated => "order.statusUpdated",
            EventName::KitchenTicketCreated => "kitchen.ticketCreated",
            EventName::KitchenTicketUpdated => "kitchen.ticketUpdated",
            EventName::RiderLocationUpdated => "rider.locationUpdated",
            EventName::DeliveryStatusUpdated => "delivery.statusUpdated",
            EventName::PosSessionUpdated => "pos.sessionUpdated",
            EventName::TableStatusUpdated => "table.statusUpdated",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: EventName,
    pub data: serde_json::Value,
    pub timestamp: i64,
}

impl RealtimeEvent {
    /// Build an event from any serializable payload
    pub fn new<T: Serialize>(event: EventName, data: &T) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::error!(event = %event, error = %e, "Failed to serialize event payload");
            serde_json::Value::Null
        });
        Self {
            event,
            data,
            timestamp: crate::util::now_millis(),
        }
    }

    /// Readiness message listing the connection's scopes
    pub fn ready(scopes: &[Scope]) -> Self {
        Self::new(EventName::ConnectionReady, &ConnectionReady { scopes: scopes.to_vec() })
    }

    /// JSON text frame
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
