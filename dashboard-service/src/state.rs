//! Application state shared across handlers and the scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::adapters::Adapters;
use crate::auth_core::AuthCore;
use crate::config::Config;
use crate::error::Result;
use crate::storage::StorageGateway;

/// Shared application state. Cheap to clone: everything inside is an `Arc`
/// or itself internally reference-counted (`StorageGateway`'s `PgPool`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: StorageGateway,
    pub adapters: Arc<Adapters>,
    pub auth: Arc<AuthCore>,
    scheduler_running: Arc<AtomicBool>,
}

impl AppState {
    /// Build the application state: connect the pool, ensure the schema
    /// exists, and construct the Upstream Adapters and Auth Core. A failure
    /// here is fatal at startup (spec §7 propagation policy).
    pub async fn new(config: Config) -> Result<Self> {
        let pool = crate::database::create_pool(&config.database).await?;
        let storage = StorageGateway::new(pool, config.database.schema.clone());
        storage.ensure_initialized().await?;

        let adapters = Adapters::new(&config.upstream)?;
        let auth = AuthCore::new(&config.auth, &config.rate_limit)?;

        Ok(Self {
            config: Arc::new(config),
            storage,
            adapters: Arc::new(adapters),
            auth: Arc::new(auth),
            scheduler_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn mark_scheduler_running(&self, running: bool) {
        self.scheduler_running.store(running, Ordering::SeqCst);
    }

    pub fn scheduler_running(&self) -> bool {
        self.scheduler_running.load(Ordering::SeqCst)
    }

    /// Cheap liveness probe for the `/health` handler: a round-trip `SELECT 1`.
    pub async fn database_connected(&self) -> bool {
        sqlx::query("SELECT 1").execute(self.storage.pool()).await.is_ok()
    }
}

