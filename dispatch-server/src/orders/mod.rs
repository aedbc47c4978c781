//! Order lifecycle
//!
//! ```text
//! pending ──► preparing ──► ready ──► completed
//!    │            │           │
//!    └────────────┴───────────┴──► cancelled
//! ```
//!
//! Payment status runs its own machine, see [`payment`].

mod lifecycle;
pub mod payment;

pub use lifecycle::{OrderLifecycle, can_transition, is_terminal};
