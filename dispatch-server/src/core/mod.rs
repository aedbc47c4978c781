//! Core: configuration, shared state, HTTP server and background tasks
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - pool plus every lifecycle component, cheap to clone
//! - [`Server`] - HTTP server with graceful shutdown
//! - [`BackgroundTasks`] - registry of long-running tasks

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::{Server, build_app};
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
