//! Scheduler (spec §4.5): single-process cooperative jobs driving the
//! watchlist poll/roll-up/retention cycle.
//!
//! Each job runs in its own task as a `tokio::time::interval` loop with
//! [`MissedTickBehavior::Skip`] -- since the loop body runs the job to
//! completion before calling `tick()` again, at most one instance of a job
//! is ever in flight, and a slow run simply skips the ticks it overran
//! instead of bursting to catch up (spec: "skip new fire if the previous
//! still runs"). Per-job and per-item failures are logged and never stop
//! the loop (spec §4.5 failure isolation).

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Handle to the running scheduler. Dropping it without calling
/// [`Scheduler::shutdown`] leaves the jobs running -- always shut down
/// explicitly so in-flight work gets its grace period.
pub struct Scheduler {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn every job. Must only be called once the Storage Gateway and
    /// Upstream Adapters inside `state` are fully initialized (spec §4.5
    /// startup ordering) -- true by construction since `AppState::new`
    /// only returns after both succeed.
    pub fn start(state: AppState) -> Self {
        let cancel = CancellationToken::new();
        state.mark_scheduler_running(true);

        let cfg = state.config.scheduler.clone();
        let now = Instant::now();
        let mut handles = Vec::with_capacity(8);

        handles.push(spawn_job(
            "sample_player_counts",
            interval(Duration::from_secs(cfg.sample_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_sample_player_counts(state)),
        ));

        handles.push(spawn_job(
            "refresh_watchlist",
            interval(Duration::from_secs(cfg.refresh_watchlist_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_refresh_watchlist(state)),
        ));

        handles.push(spawn_job(
            "backfill_game_metadata",
            interval_at(
                now + Duration::from_secs(120),
                Duration::from_secs(cfg.backfill_interval_secs.max(1)),
            ),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_backfill_metadata(state)),
        ));

        handles.push(spawn_job(
            "rollup_hourly",
            interval(Duration::from_secs(cfg.rollup_hourly_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_rollup_hourly(state)),
        ));

        handles.push(spawn_job(
            "rollup_daily",
            interval(Duration::from_secs(cfg.rollup_daily_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_rollup_daily(state)),
        ));

        handles.push(spawn_job(
            "prune_raw",
            interval(Duration::from_secs(cfg.prune_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_prune_raw(state)),
        ));

        handles.push(spawn_job(
            "prune_hourly",
            interval(Duration::from_secs(cfg.prune_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_prune_hourly(state)),
        ));

        handles.push(spawn_job(
            "prune_daily",
            interval(Duration::from_secs(cfg.prune_interval_secs.max(1))),
            cancel.clone(),
            state.clone(),
            |state| Box::pin(job_prune_daily(state)),
        ));

        Self { cancel, handles }
    }

    /// Signal every job to stop, wait up to `shutdown_grace_secs` for
    /// in-flight work to finish, then abort whatever remains.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        let joined = tokio::time::timeout(grace, futures::future::join_all(self.handles)).await;
        if joined.is_err() {
            tracing::warn!("scheduler shutdown grace period elapsed; remaining jobs were aborted");
        }
    }
}

type JobFuture = std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;

fn spawn_job(
    name: &'static str,
    mut tick: tokio::time::Interval,
    cancel: CancellationToken,
    state: AppState,
    job: impl Fn(AppState) -> JobFuture + Send + 'static,
) -> JoinHandle<()> {
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    tracing::debug!(job = name, "scheduler job firing");
                    job(state.clone()).await;
                }
                _ = cancel.cancelled() => {
                    tracing::info!(job = name, "scheduler job stopping");
                    break;
                }
            }
        }
    })
}

async fn job_sample_player_counts(state: AppState) {
    let watchlist = match state.storage.get_watchlist().await {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "sample_player_counts: failed to load watchlist");
            return;
        }
    };
    if watchlist.is_empty() {
        return;
    }
    let names: HashMap<i64, String> = watchlist.iter().map(|w| (w.appid, w.name.clone())).collect();
    let appids: Vec<i64> = watchlist.iter().map(|w| w.appid).collect();

    let samples = state.adapters.sample_player_counts(appids).await;
    let ts = Utc::now().timestamp();
    for (appid, count) in samples {
        if let Err(e) = state.storage.insert_player_count(appid, ts, count).await {
            tracing::warn!(appid, error = %e, "sample_player_counts: failed to record raw sample");
            continue;
        }
        let Some(name) = names.get(&appid) else { continue };
        if let Err(e) = state.storage.upsert_watchlist(appid, name, count).await {
            tracing::warn!(appid, error = %e, "sample_player_counts: failed to update watchlist");
        }
    }
}

async fn job_refresh_watchlist(state: AppState) {
    let top_n = state.config.scheduler.watchlist_top_n;
    let entries = match state.adapters.catalog.get_most_played_top_n(top_n).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "refresh_watchlist: failed to fetch most-played list");
            return;
        }
    };
    for entry in entries {
        if let Err(e) = state
            .storage
            .upsert_watchlist(entry.appid, &entry.name, entry.current_players)
            .await
        {
            tracing::warn!(appid = entry.appid, error = %e, "refresh_watchlist: failed to upsert entry");
        }
    }
}

async fn job_backfill_metadata(state: AppState) {
    let watchlist = match state.storage.get_watchlist().await {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "backfill_game_metadata: failed to load watchlist");
            return;
        }
    };

    let mut needs_backfill = Vec::new();
    for entry in &watchlist {
        match state.storage.get_game(entry.appid).await {
            Ok(Some(details)) if !details.genres.is_empty() || !details.categories.is_empty() => {}
            Ok(_) => needs_backfill.push(entry.appid),
            Err(e) => {
                tracing::warn!(appid = entry.appid, error = %e, "backfill_game_metadata: failed to check existing row");
            }
        }
    }
    if needs_backfill.is_empty() {
        return;
    }

    let details = state.adapters.enrich_catalog(needs_backfill).await;
    for game in details {
        let appid = game.appid;
        if let Err(e) = state.storage.upsert_game(&game).await {
            tracing::warn!(appid, error = %e, "backfill_game_metadata: failed to upsert game");
        }
    }
}

async fn job_rollup_hourly(state: AppState) {
    let now = Utc::now().timestamp();
    let current_hour_start = now - now.rem_euclid(3600);
    let since = current_hour_start - 3600;
    if let Err(e) = state.storage.rollup_hourly(since, current_hour_start, None).await {
        tracing::warn!(error = %e, "rollup_hourly: failed");
    }
}

async fn job_rollup_daily(state: AppState) {
    let now = Utc::now().timestamp();
    let today_start = now - now.rem_euclid(86_400);
    let since = today_start - 86_400;
    if let Err(e) = state.storage.rollup_daily(since, today_start, None).await {
        tracing::warn!(error = %e, "rollup_daily: failed");
    }
}

async fn job_prune_raw(state: AppState) {
    let older_than = Utc::now().timestamp() - state.config.retention.raw_days * 86_400;
    match state.storage.prune_raw(older_than).await {
        Ok(n) => tracing::debug!(rows = n, "prune_raw: complete"),
        Err(e) => tracing::warn!(error = %e, "prune_raw: failed"),
    }
}

async fn job_prune_hourly(state: AppState) {
    let older_than = Utc::now().timestamp() - state.config.retention.hourly_days * 86_400;
    match state.storage.prune_hourly(older_than).await {
        Ok(n) => tracing::debug!(rows = n, "prune_hourly: complete"),
        Err(e) => tracing::warn!(error = %e, "prune_hourly: failed"),
    }
}

async fn job_prune_daily(state: AppState) {
    let older_than = Utc::now() - chrono::Duration::days(state.config.retention.daily_days);
    let ymd = older_than.format("%Y-%m-%d").to_string();
    match state.storage.prune_daily(&ymd).await {
        Ok(n) => tracing::debug!(rows = n, "prune_daily: complete"),
        Err(e) => tracing::warn!(error = %e, "prune_daily: failed"),
    }
}
