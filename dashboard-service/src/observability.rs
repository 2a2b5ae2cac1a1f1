//! Structured logging setup
//!
//! Out of scope per spec §1 ("logging configuration" is external plumbing);
//! what lives here is the minimal bootstrap every binary built on this crate
//! needs so handlers and scheduler jobs can just call `tracing::info!` etc.

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize a JSON-formatted tracing subscriber at the configured level.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.service.log_level.clone();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("tracing initialized for service: {}", config.service.name);

    Ok(())
}
