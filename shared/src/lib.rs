//! Shared types for the branch dispatch core
//!
//! Wire/domain models, the unified error system, real-time message types
//! and small utilities used by `dispatch-server` and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{EventName, RealtimeEvent, Scope};
