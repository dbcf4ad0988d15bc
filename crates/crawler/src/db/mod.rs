mod sqlite;

pub use sqlite::*;

use async_trait::async_trait;
use time::{macros::format_description, PrimitiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: Option<String>,
}

/// Latest reading for a station. Timestamps are naive; any source offset is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station_id: String,
    pub temperature: f64,
    pub pressure: Option<f64>,
    pub observed_at: PrimitiveDateTime,
}

/// Persistence operations used by the ingestor.
///
/// Implementations log and swallow store failures: a `false` return means the
/// operation did not happen, never that the caller should abort.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn station_exists(&self, station_id: &str) -> bool;
    async fn upsert_station(&self, station_id: &str, name: &str) -> bool;
    async fn upsert_observation(&self, observation: &Observation) -> bool;
}

pub fn format_obs_time(value: &PrimitiveDateTime) -> Result<String, time::error::Format> {
    value.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
}

pub fn parse_obs_time(value: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
}
