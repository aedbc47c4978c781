//! POS cash-drawer sessions
//!
//! At most one open session per branch, enforced by a partial unique index
//! so concurrent opens cannot both succeed. Closing is a conditional update
//! and happens exactly once.

mod manager;

pub use manager::{PosSessionManager, parse_cash};
