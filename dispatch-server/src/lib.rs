//! Branch dispatch server
//!
//! Order lifecycle, POS sessions, kitchen tickets, delivery pricing and
//! rider dispatch for a multi-branch restaurant, over one SQLite database.
//!
//! # Module layout
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # config, shared state, HTTP server, background tasks
//! ├── auth/          # JWT validation, permissions, branch-scope policy
//! ├── api/           # HTTP and WebSocket routes
//! ├── db/            # pool, migrations, repositories
//! ├── orders/        # order and payment state machines
//! ├── pos/           # cash-drawer sessions
//! ├── kitchen/       # kitchen tickets
//! ├── pricing/       # delivery charges and geocoding
//! ├── dispatch/      # riders and deliveries
//! ├── realtime/      # scoped event fan-out
//! ├── side_effects/  # outbox worker: loyalty, inventory
//! └── utils/         # logging, validation, money
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod dispatch;
pub mod kitchen;
pub mod orders;
pub mod pos;
pub mod pricing;
pub mod realtime;
pub mod side_effects;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export public types
pub use auth::{AccessPolicy, CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use dispatch::RiderDispatcher;
pub use orders::OrderLifecycle;
pub use pricing::PricingEngine;
pub use realtime::RealtimeBus;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - accepts tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, then configure logging from the environment.
///
/// Production always logs JSON lines.
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json || config.is_production(),
        config.log_dir.as_deref(),
    );
    config
}
