//! # dashboard-service
//!
//! Backend core for the custom Steam dashboard: a Storage Gateway over
//! Postgres, Upstream Adapters for the Steam-facing HTTP providers, a
//! two-layer Auth Core (signed requests + bearer sessions), the Request
//! Gate and rate limiter that sit in front of the API Surface, and the
//! Scheduler that keeps the watchlist sampled, rolled up, and pruned.
//!
//! `dashboard-api` wires this crate's [`state::AppState`], [`handlers::router`],
//! and [`server::Server`] together into a running binary.

pub mod adapters;
pub mod auth_core;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod rate_limit_gate;
pub mod request_gate;
pub mod scheduler;
pub mod server;
pub mod state;
pub mod storage;
pub mod validation;

/// Convenience re-exports for `dashboard-api` and tests.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::router;
    pub use crate::observability::init_tracing;
    pub use crate::scheduler::Scheduler;
    pub use crate::server::Server;
    pub use crate::state::AppState;
}
