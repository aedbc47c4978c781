//! Rider dispatch
//!
//! ```text
//! rider:     online ⇄ offline ⇄ on_break        (staff / rider toggle)
//!            online ──assign──► busy ──delivered/cancelled──► online
//!
//! delivery:  assigned ──► accepted ──► picked_up ──► delivered
//!               └────────────┴────────────┴─────────► cancelled
//! ```
//!
//! `assign` runs in one transaction whose first statement is the
//! conditional rider claim, so of two concurrent assigns on one rider
//! exactly one wins and the other sees `RiderUnavailable`.

mod dispatcher;

pub use dispatcher::{RiderDispatcher, can_advance};
