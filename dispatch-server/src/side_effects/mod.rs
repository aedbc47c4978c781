//! Side-effect pipeline (transactional outbox)
//!
//! ```text
//! OrderLifecycle::create ──tx──► orders + order_item + side_effect_job
//!                                  │
//!                          queue.notify()
//!                                  ▼
//! SideEffectWorker ◄── wake / periodic scan ── side_effect_job (pending, due)
//!     ├─ loyalty_accrual      → loyalty_points + loyalty_transaction
//!     └─ inventory_deduction  → inventory_transaction (sale, per line)
//! ```
//!
//! Jobs survive restarts; failures back off exponentially and are
//! dead-lettered after the configured number of attempts. Both handlers
//! are idempotent, so re-running a job after a crash is harmless.

pub mod inventory;
pub mod loyalty;
mod queue;
mod worker;

pub use queue::SideEffectQueue;
pub use worker::{SideEffectWorker, retry_delay_secs};
