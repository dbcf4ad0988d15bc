use anyhow::{Context, Result};
use async_trait::async_trait;
use slog::{debug, error, info, Logger};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::{str::FromStr, time::Duration};

use super::{format_obs_time, parse_obs_time, Observation, Station, WeatherStore};

pub struct Database {
    pool: SqlitePool,
    logger: Logger,
}

impl Database {
    /// Opens (creating if needed) `{path}/weather.sqlite` and applies the schema.
    pub async fn connect(path: &str, logger: Logger) -> Result<Self> {
        let db_path = format!("{}/weather.sqlite", path);

        cwa_weather_core::create_dir_all(path)
            .with_context(|| format!("Failed to create database directory: {path}"))?;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("foreign_keys", "ON");

        let db = Self::open(options, logger).await?;
        info!(db.logger, "SQLite database opened at: {}", db_path);
        Ok(db)
    }

    /// Private in-memory database, alive until the pool is closed.
    pub async fn in_memory(logger: Logger) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str("sqlite::memory:")?.pragma("foreign_keys", "ON");
        Self::open(options, logger).await
    }

    async fn open(options: SqliteConnectOptions, logger: Logger) -> Result<Self> {
        // One connection: rows are written strictly one after another, and an
        // in-memory database only exists on the connection that created it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let db = Self { pool, logger };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to apply database schema")?;
        Ok(())
    }

    /// Releases every connection; later calls on this handle fail.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(self.logger, "database connection closed");
    }

    pub async fn get_station(&self, station_id: &str) -> Result<Option<Station>> {
        let row = sqlx::query("SELECT id, name FROM weather_station WHERE id = ?")
            .bind(station_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Station {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    pub async fn get_observation(&self, station_id: &str) -> Result<Option<Observation>> {
        let row = sqlx::query(
            "SELECT station_id, temp, pressure, obs_time
             FROM weather_temperature WHERE station_id = ?",
        )
        .bind(station_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Observation> {
            let obs_time: String = row.get("obs_time");
            Ok(Observation {
                station_id: row.get("station_id"),
                temperature: row.get("temp"),
                pressure: row.get("pressure"),
                observed_at: parse_obs_time(&obs_time)
                    .with_context(|| format!("stored obs_time is invalid: {obs_time}"))?,
            })
        })
        .transpose()
    }

    pub async fn station_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weather_station")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn observation_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weather_temperature")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn try_station_exists(&self, station_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weather_station WHERE id = ?")
            .bind(station_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn try_upsert_station(&self, station_id: &str, name: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO weather_station (id, name) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(station_id)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_upsert_observation(&self, observation: &Observation) -> Result<()> {
        let obs_time = format_obs_time(&observation.observed_at)?;
        sqlx::query(
            "INSERT INTO weather_temperature (station_id, temp, pressure, obs_time)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(station_id) DO UPDATE SET
                temp = excluded.temp,
                pressure = excluded.pressure,
                obs_time = excluded.obs_time,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(&observation.station_id)
        .bind(observation.temperature)
        .bind(observation.pressure)
        .bind(obs_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl WeatherStore for Database {
    async fn station_exists(&self, station_id: &str) -> bool {
        match self.try_station_exists(station_id).await {
            Ok(exists) => {
                debug!(self.logger, "station {} exists: {}", station_id, exists);
                exists
            }
            Err(e) => {
                error!(self.logger, "error checking station {}: {}", station_id, e);
                false
            }
        }
    }

    async fn upsert_station(&self, station_id: &str, name: &str) -> bool {
        match self.try_upsert_station(station_id, name).await {
            Ok(()) => {
                debug!(self.logger, "station stored: {} ({})", station_id, name);
                true
            }
            Err(e) => {
                error!(self.logger, "error storing station {}: {}", station_id, e);
                false
            }
        }
    }

    async fn upsert_observation(&self, observation: &Observation) -> bool {
        match self.try_upsert_observation(observation).await {
            Ok(()) => {
                debug!(
                    self.logger,
                    "observation stored - station: {}, temp: {}°C, pressure: {:?}hPa, time: {}",
                    observation.station_id,
                    observation.temperature,
                    observation.pressure,
                    observation.observed_at
                );
                true
            }
            Err(e) => {
                error!(
                    self.logger,
                    "error storing observation for {}: {}", observation.station_id, e
                );
                false
            }
        }
    }
}
