use std::time::Duration;

use dashboard_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let state = AppState::new(config.clone()).await?;
    let scheduler = Scheduler::start(state.clone());
    let shutdown_grace = Duration::from_secs(config.scheduler.shutdown_grace_secs);

    let app = router();
    let server = Server::new(config);
    let result = server.serve(app, state).await;

    tracing::info!("draining scheduler jobs");
    scheduler.shutdown(shutdown_grace).await;

    result.map_err(anyhow::Error::from)
}
