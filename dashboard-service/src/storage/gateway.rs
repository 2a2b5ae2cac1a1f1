//! Storage Gateway: pooled Postgres access with schema-scoped statements.
//!
//! Every operation here is grounded on the pooling/retry pattern in
//! `crate::database` and uses runtime-checked `sqlx::query`/`query_as` (no
//! `query!` macro, since there is no live database to check against at
//! build time) with bound parameters throughout -- table names are the only
//! thing ever interpolated into SQL, and those come exclusively from the
//! whitelisted [`Table`](super::schema::Table) enum.

use chrono::Utc;
use sqlx::PgPool;

use crate::error::{Error, Result};

use super::models::{Game, GameDetails, PlayerSample, WatchlistEntry};
use super::schema::{SchemaNames, Table};

/// Hard ceiling enforced regardless of the caller-supplied `limit` (spec §4.1,
/// invariant 10 in §8).
pub const MAX_HISTORY_LIMIT: i64 = 10_000;

#[derive(Clone)]
pub struct StorageGateway {
    pool: PgPool,
    names: SchemaNames,
}

impl StorageGateway {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            names: SchemaNames::new(schema),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the schema and all tables if missing. Safe to call repeatedly.
    pub async fn ensure_initialized(&self) -> Result<()> {
        let schema = self.names.schema();
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
            .execute(&self.pool)
            .await?;

        let watchlist = self.names.qualified(Table::Watchlist);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {watchlist} (
                appid BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                last_count BIGINT NOT NULL DEFAULT 0,
                updated_at BIGINT NOT NULL
            )"
        ))
        .execute(&self.pool)
        .await?;

        let raw = self.names.qualified(Table::PlayerSamplesRaw);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {raw} (
                appid BIGINT NOT NULL REFERENCES {watchlist}(appid) ON DELETE CASCADE,
                ts BIGINT NOT NULL,
                count BIGINT NOT NULL,
                PRIMARY KEY (appid, ts)
            )"
        ))
        .execute(&self.pool)
        .await?;

        let hourly = self.names.qualified(Table::PlayerSamplesHourly);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {hourly} (
                appid BIGINT NOT NULL REFERENCES {watchlist}(appid) ON DELETE CASCADE,
                hour_bucket_ts BIGINT NOT NULL,
                avg DOUBLE PRECISION NOT NULL,
                min BIGINT NOT NULL,
                max BIGINT NOT NULL,
                p95 BIGINT NOT NULL,
                PRIMARY KEY (appid, hour_bucket_ts)
            )"
        ))
        .execute(&self.pool)
        .await?;

        let daily = self.names.qualified(Table::PlayerSamplesDaily);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {daily} (
                appid BIGINT NOT NULL REFERENCES {watchlist}(appid) ON DELETE CASCADE,
                day_ymd TEXT NOT NULL,
                avg DOUBLE PRECISION NOT NULL,
                min BIGINT NOT NULL,
                max BIGINT NOT NULL,
                p95 BIGINT NOT NULL,
                PRIMARY KEY (appid, day_ymd)
            )"
        ))
        .execute(&self.pool)
        .await?;

        let games = self.names.qualified(Table::Games);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {games} (
                appid BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                is_free BOOLEAN NOT NULL DEFAULT FALSE,
                price DOUBLE PRECISION NOT NULL DEFAULT 0,
                release_date TEXT,
                coming_soon BOOLEAN NOT NULL DEFAULT FALSE,
                header_image TEXT,
                background_image TEXT,
                detailed_description TEXT
            )"
        ))
        .execute(&self.pool)
        .await?;

        let genres = self.names.qualified(Table::GameGenres);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {genres} (
                appid BIGINT NOT NULL REFERENCES {games}(appid) ON DELETE CASCADE,
                genre TEXT NOT NULL,
                PRIMARY KEY (appid, genre)
            )"
        ))
        .execute(&self.pool)
        .await?;

        let categories = self.names.qualified(Table::GameCategories);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {categories} (
                appid BIGINT NOT NULL REFERENCES {games}(appid) ON DELETE CASCADE,
                category TEXT NOT NULL,
                PRIMARY KEY (appid, category)
            )"
        ))
        .execute(&self.pool)
        .await?;

        tracing::info!(schema, "storage schema ensured");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Watchlist
    // ------------------------------------------------------------------

    pub async fn upsert_watchlist(&self, appid: i64, name: &str, last_count: i64) -> Result<()> {
        let table = self.names.qualified(Table::Watchlist);
        let now = Utc::now().timestamp();
        sqlx::query(&format!(
            "INSERT INTO {table} (appid, name, last_count, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (appid) DO UPDATE SET
                name = EXCLUDED.name,
                last_count = EXCLUDED.last_count,
                updated_at = EXCLUDED.updated_at"
        ))
        .bind(appid)
        .bind(name)
        .bind(last_count)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_watchlist(&self) -> Result<Vec<WatchlistEntry>> {
        let table = self.names.qualified(Table::Watchlist);
        let rows = sqlx::query_as::<_, WatchlistEntry>(&format!(
            "SELECT appid, name, last_count, updated_at FROM {table} ORDER BY last_count DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn remove_from_watchlist(&self, appid: i64) -> Result<()> {
        let table = self.names.qualified(Table::Watchlist);
        sqlx::query(&format!("DELETE FROM {table} WHERE appid = $1"))
            .bind(appid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Raw samples
    // ------------------------------------------------------------------

    /// Idempotent on `(appid, ts)`. Rejected (foreign key violation surfaced
    /// as a storage error) if `appid` is not on the watchlist -- spec §8
    /// invariant 1.
    pub async fn insert_player_count(&self, appid: i64, ts: i64, count: i64) -> Result<()> {
        let table = self.names.qualified(Table::PlayerSamplesRaw);
        sqlx::query(&format!(
            "INSERT INTO {table} (appid, ts, count) VALUES ($1, $2, $3)
             ON CONFLICT (appid, ts) DO NOTHING"
        ))
        .bind(appid)
        .bind(ts)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(map_fk_violation)?;
        Ok(())
    }

    pub async fn get_player_count_history(&self, appid: i64, limit: i64) -> Result<Vec<PlayerSample>> {
        let clamped = limit.clamp(0, MAX_HISTORY_LIMIT);
        let table = self.names.qualified(Table::PlayerSamplesRaw);
        let rows = sqlx::query_as::<_, PlayerSample>(&format!(
            "SELECT appid, ts, count FROM {table}
             WHERE appid = $1 ORDER BY ts DESC LIMIT $2"
        ))
        .bind(appid)
        .bind(clamped)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Games / genres / categories
    // ------------------------------------------------------------------

    pub async fn upsert_game(&self, details: &GameDetails) -> Result<()> {
        let table = self.names.qualified(Table::Games);
        sqlx::query(&format!(
            "INSERT INTO {table}
                (appid, name, is_free, price, release_date, coming_soon,
                 header_image, background_image, detailed_description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (appid) DO UPDATE SET
                name = EXCLUDED.name,
                is_free = EXCLUDED.is_free,
                price = EXCLUDED.price,
                release_date = EXCLUDED.release_date,
                coming_soon = EXCLUDED.coming_soon,
                header_image = EXCLUDED.header_image,
                background_image = EXCLUDED.background_image,
                detailed_description = EXCLUDED.detailed_description"
        ))
        .bind(details.appid)
        .bind(&details.name)
        .bind(details.is_free)
        .bind(details.price)
        .bind(&details.release_date)
        .bind(details.coming_soon)
        .bind(&details.header_image)
        .bind(&details.background_image)
        .bind(&details.detailed_description)
        .execute(&self.pool)
        .await?;

        self.upsert_game_genres(details.appid, &details.genres).await?;
        self.upsert_game_categories(details.appid, &details.categories).await?;
        Ok(())
    }

    pub async fn upsert_game_genres(&self, appid: i64, genres: &[String]) -> Result<()> {
        if genres.is_empty() {
            return Ok(());
        }
        let table = self.names.qualified(Table::GameGenres);
        for genre in genres {
            sqlx::query(&format!(
                "INSERT INTO {table} (appid, genre) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            ))
            .bind(appid)
            .bind(genre)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn upsert_game_categories(&self, appid: i64, categories: &[String]) -> Result<()> {
        if categories.is_empty() {
            return Ok(());
        }
        let table = self.names.qualified(Table::GameCategories);
        for category in categories {
            sqlx::query(&format!(
                "INSERT INTO {table} (appid, category) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            ))
            .bind(appid)
            .bind(category)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn get_game(&self, appid: i64) -> Result<Option<GameDetails>> {
        let games = self.names.qualified(Table::Games);
        let row = sqlx::query_as::<_, Game>(&format!(
            "SELECT appid, name, is_free, price, release_date, coming_soon,
                    header_image, background_image, detailed_description
             FROM {games} WHERE appid = $1"
        ))
        .bind(appid)
        .fetch_optional(&self.pool)
        .await?;

        let Some(game) = row else { return Ok(None) };
        let mut details: GameDetails = game.into();
        details.genres = self.genres_for(appid).await?;
        details.categories = self.categories_for(appid).await?;
        Ok(Some(details))
    }

    pub async fn get_all_games(&self) -> Result<Vec<GameDetails>> {
        let games = self.names.qualified(Table::Games);
        let rows = sqlx::query_as::<_, Game>(&format!(
            "SELECT appid, name, is_free, price, release_date, coming_soon,
                    header_image, background_image, detailed_description
             FROM {games} ORDER BY appid"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for game in rows {
            let appid = game.appid;
            let mut details: GameDetails = game.into();
            details.genres = self.genres_for(appid).await?;
            details.categories = self.categories_for(appid).await?;
            out.push(details);
        }
        Ok(out)
    }

    pub async fn get_games_by_genre(&self, genre: &str) -> Result<Vec<GameDetails>> {
        let games = self.names.qualified(Table::Games);
        let genres = self.names.qualified(Table::GameGenres);
        let rows = sqlx::query_as::<_, Game>(&format!(
            "SELECT g.appid, g.name, g.is_free, g.price, g.release_date, g.coming_soon,
                    g.header_image, g.background_image, g.detailed_description
             FROM {games} g
             JOIN {genres} gg ON gg.appid = g.appid
             WHERE gg.genre = $1
             ORDER BY g.appid"
        ))
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for game in rows {
            let appid = game.appid;
            let mut details: GameDetails = game.into();
            details.genres = self.genres_for(appid).await?;
            details.categories = self.categories_for(appid).await?;
            out.push(details);
        }
        Ok(out)
    }

    pub async fn get_games_by_category(&self, category: &str) -> Result<Vec<GameDetails>> {
        let games = self.names.qualified(Table::Games);
        let categories = self.names.qualified(Table::GameCategories);
        let rows = sqlx::query_as::<_, Game>(&format!(
            "SELECT g.appid, g.name, g.is_free, g.price, g.release_date, g.coming_soon,
                    g.header_image, g.background_image, g.detailed_description
             FROM {games} g
             JOIN {categories} gc ON gc.appid = g.appid
             WHERE gc.category = $1
             ORDER BY g.appid"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for game in rows {
            let appid = game.appid;
            let mut details: GameDetails = game.into();
            details.genres = self.genres_for(appid).await?;
            details.categories = self.categories_for(appid).await?;
            out.push(details);
        }
        Ok(out)
    }

    async fn genres_for(&self, appid: i64) -> Result<Vec<String>> {
        let table = self.names.qualified(Table::GameGenres);
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT genre FROM {table} WHERE appid = $1 ORDER BY genre"
        ))
        .bind(appid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(g,)| g).collect())
    }

    async fn categories_for(&self, appid: i64) -> Result<Vec<String>> {
        let table = self.names.qualified(Table::GameCategories);
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT category FROM {table} WHERE appid = $1 ORDER BY category"
        ))
        .bind(appid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    // ------------------------------------------------------------------
    // Roll-ups
    // ------------------------------------------------------------------

    /// Recompute hourly aggregates for every hour bucket touched by raw
    /// samples in `[since, until)`, optionally restricted to `appids`.
    /// Idempotent: re-running over the same window upserts identical rows
    /// (spec §8 invariant 3).
    pub async fn rollup_hourly(
        &self,
        since: i64,
        until: i64,
        appids: Option<&[i64]>,
    ) -> Result<usize> {
        let buckets = self.hour_buckets_for_window(since, until, appids).await?;
        let mut written = 0;
        for (appid, bucket) in buckets {
            let samples = self.raw_samples_in(appid, bucket, bucket + 3600).await?;
            if samples.is_empty() {
                continue;
            }
            let stats = Stats::from_counts(&samples);
            let table = self.names.qualified(Table::PlayerSamplesHourly);
            sqlx::query(&format!(
                "INSERT INTO {table} (appid, hour_bucket_ts, avg, min, max, p95)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (appid, hour_bucket_ts) DO UPDATE SET
                    avg = EXCLUDED.avg, min = EXCLUDED.min, max = EXCLUDED.max, p95 = EXCLUDED.p95"
            ))
            .bind(appid)
            .bind(bucket)
            .bind(stats.avg)
            .bind(stats.min)
            .bind(stats.max)
            .bind(stats.p95)
            .execute(&self.pool)
            .await?;
            written += 1;
        }
        Ok(written)
    }

    /// Recompute daily aggregates for every UTC day touched in `[since, until)`.
    pub async fn rollup_daily(
        &self,
        since: i64,
        until: i64,
        appids: Option<&[i64]>,
    ) -> Result<usize> {
        let days = self.days_for_window(since, until, appids).await?;
        let mut written = 0;
        for (appid, ymd, day_start, day_end) in days {
            let samples = self.raw_samples_in(appid, day_start, day_end).await?;
            if samples.is_empty() {
                continue;
            }
            let stats = Stats::from_counts(&samples);
            let table = self.names.qualified(Table::PlayerSamplesDaily);
            sqlx::query(&format!(
                "INSERT INTO {table} (appid, day_ymd, avg, min, max, p95)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (appid, day_ymd) DO UPDATE SET
                    avg = EXCLUDED.avg, min = EXCLUDED.min, max = EXCLUDED.max, p95 = EXCLUDED.p95"
            ))
            .bind(appid)
            .bind(ymd)
            .bind(stats.avg)
            .bind(stats.min)
            .bind(stats.max)
            .bind(stats.p95)
            .execute(&self.pool)
            .await?;
            written += 1;
        }
        Ok(written)
    }

    async fn raw_samples_in(&self, appid: i64, from_ts: i64, to_ts: i64) -> Result<Vec<i64>> {
        let table = self.names.qualified(Table::PlayerSamplesRaw);
        let rows: Vec<(i64,)> = sqlx::query_as(&format!(
            "SELECT count FROM {table} WHERE appid = $1 AND ts >= $2 AND ts < $3 ORDER BY count ASC"
        ))
        .bind(appid)
        .bind(from_ts)
        .bind(to_ts)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    async fn hour_buckets_for_window(
        &self,
        since: i64,
        until: i64,
        appids: Option<&[i64]>,
    ) -> Result<Vec<(i64, i64)>> {
        let table = self.names.qualified(Table::PlayerSamplesRaw);
        let rows: Vec<(i64, i64)> = if let Some(appids) = appids {
            sqlx::query_as(&format!(
                "SELECT DISTINCT appid, (ts / 3600) * 3600 AS bucket
                 FROM {table}
                 WHERE ts >= $1 AND ts < $2 AND appid = ANY($3)
                 ORDER BY appid, bucket"
            ))
            .bind(since)
            .bind(until)
            .bind(appids)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(&format!(
                "SELECT DISTINCT appid, (ts / 3600) * 3600 AS bucket
                 FROM {table}
                 WHERE ts >= $1 AND ts < $2
                 ORDER BY appid, bucket"
            ))
            .bind(since)
            .bind(until)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    async fn days_for_window(
        &self,
        since: i64,
        until: i64,
        appids: Option<&[i64]>,
    ) -> Result<Vec<(i64, String, i64, i64)>> {
        let buckets = self.hour_buckets_for_window(since, until, appids).await?;
        let mut days: Vec<(i64, String, i64, i64)> = Vec::new();
        for (appid, bucket) in buckets {
            let day_start = (bucket / 86_400) * 86_400;
            let day_end = day_start + 86_400;
            let ymd = chrono::DateTime::<Utc>::from_timestamp(day_start, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            if !days.iter().any(|(a, y, _, _)| *a == appid && y == &ymd) {
                days.push((appid, ymd, day_start, day_end));
            }
        }
        Ok(days)
    }

    // ------------------------------------------------------------------
    // Retention pruning
    // ------------------------------------------------------------------

    pub async fn prune_raw(&self, older_than: i64) -> Result<u64> {
        let table = self.names.qualified(Table::PlayerSamplesRaw);
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE ts < $1"))
            .bind(older_than)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn prune_hourly(&self, older_than: i64) -> Result<u64> {
        let table = self.names.qualified(Table::PlayerSamplesHourly);
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE hour_bucket_ts < $1"))
            .bind(older_than)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn prune_daily(&self, older_than_ymd: &str) -> Result<u64> {
        let table = self.names.qualified(Table::PlayerSamplesDaily);
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE day_ymd < $1"))
            .bind(older_than_ymd)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// `avg`/`min`/`max`/`p95` over an ascending list of sample counts
/// (spec §4.1: `p95` at ascending index `ceil(0.95*N) - 1`).
struct Stats {
    avg: f64,
    min: i64,
    max: i64,
    p95: i64,
}

impl Stats {
    fn from_counts(ascending: &[i64]) -> Self {
        let n = ascending.len();
        assert!(n > 0, "Stats::from_counts called with no samples");
        let sum: i64 = ascending.iter().sum();
        let avg = sum as f64 / n as f64;
        let min = ascending[0];
        let max = ascending[n - 1];
        let idx = ((0.95 * n as f64).ceil() as usize).saturating_sub(1).min(n - 1);
        let p95 = ascending[idx];
        Self { avg, min, max, p95 }
    }
}

/// Thin wrapper used by callers that only need the storage error mapping,
/// e.g. turning a foreign-key violation into a validation error.
pub fn map_fk_violation(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_foreign_key_violation() {
            return Error::Validation {
                field: "appid".to_string(),
                message: "not on watchlist".to_string(),
            };
        }
    }
    Error::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p95_matches_spec_formula() {
        let samples: Vec<i64> = (1..=20).collect();
        let stats = Stats::from_counts(&samples);
        // ceil(0.95*20)-1 = 18 -> zero-indexed 18th element = 19
        assert_eq!(stats.p95, 19);
        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 20);
    }

    #[test]
    fn p95_for_small_n_can_equal_max() {
        let samples = vec![10_i64, 20, 30];
        let stats = Stats::from_counts(&samples);
        assert_eq!(stats.p95, stats.max);
    }
}
