//! Real-time fan-out
//!
//! ```text
//! OrderLifecycle / PosSessionManager / KitchenTicketTracker / RiderDispatcher
//!       │ publish(event, [scopes])
//!       ▼
//! RealtimeBus
//!   └── connections: id → (scopes, bounded mpsc sender)
//!         │
//!         ▼
//!   /ws session task (one per client, drains its receiver into the socket)
//! ```
//!
//! Delivery is best-effort and at-most-once: no replay, a full buffer drops
//! the event for that connection. Per-connection order is FIFO.

mod bus;

pub use bus::{RealtimeBus, Subscription, scopes_for};
