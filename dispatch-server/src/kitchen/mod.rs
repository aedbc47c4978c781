//! Kitchen ticket tracking
//!
//! Tickets move `queued → preparing → ready → served` independently of the
//! order status. One ticket is created with every order; more can be added
//! for reprints or modifications.

mod tracker;

pub use tracker::{KitchenTicketTracker, can_advance};
