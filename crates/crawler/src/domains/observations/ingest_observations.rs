use serde::Deserialize;
use serde_json::Value;
use slog::{debug, error, info, warn, Logger};
use std::sync::Arc;

use super::{
    parse_observation_time, RawResponse, Reading, StationRecord, AIR_PRESSURE, AIR_TEMPERATURE,
};
use crate::{Observation, RecordError, StationRegistry, WeatherStore};

/// Name stored for stations neither the record nor the reference list can name.
pub const UNKNOWN_STATION: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records found in the response
    pub total: usize,
    pub saved: usize,
    /// Well-formed records whose required values were missing or no-data
    pub skipped: usize,
    /// Records without a station id
    pub unidentified: usize,
    pub errors: usize,
}

impl IngestSummary {
    /// False when nothing was saved or legitimately skipped, including an
    /// empty response.
    pub fn is_success(&self) -> bool {
        self.saved > 0 || self.skipped > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Saved,
    Skipped(String),
    Unidentified,
    Failed(RecordError),
}

enum Rejection {
    Incomplete(String),
    Invalid(RecordError),
}

pub struct ObservationIngestor {
    pub logger: Logger,
    pub store: Arc<dyn WeatherStore>,
}

impl ObservationIngestor {
    pub fn new(logger: Logger, store: Arc<dyn WeatherStore>) -> Self {
        ObservationIngestor { logger, store }
    }

    /// Walks every record once, in order. Record failures are counted, never raised.
    pub async fn ingest(&self, raw: &RawResponse, registry: &StationRegistry) -> IngestSummary {
        let records = raw.records();
        info!(self.logger, "processing {} station records", records.len());

        let mut summary = IngestSummary {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            match self.ingest_record(record, registry).await {
                RecordOutcome::Saved => summary.saved += 1,
                RecordOutcome::Skipped(_) => summary.skipped += 1,
                RecordOutcome::Unidentified => summary.unidentified += 1,
                RecordOutcome::Failed(_) => summary.errors += 1,
            }
        }

        info!(
            self.logger,
            "ingestion finished - saved: {}, skipped: {}, without id: {}, errors: {}",
            summary.saved,
            summary.skipped,
            summary.unidentified,
            summary.errors
        );
        summary
    }

    pub async fn ingest_record(&self, value: &Value, registry: &StationRegistry) -> RecordOutcome {
        let record = match StationRecord::deserialize(value) {
            Ok(record) => record,
            Err(e) => {
                return match value.get("StationId").and_then(Value::as_str) {
                    Some(id) if !id.trim().is_empty() => {
                        error!(self.logger, "error decoding record for station {}: {}", id, e);
                        debug!(self.logger, "raw record: {}", value);
                        RecordOutcome::Failed(RecordError::Malformed(e.to_string()))
                    }
                    _ => {
                        warn!(self.logger, "record has no usable station id, skipping: {}", e);
                        RecordOutcome::Unidentified
                    }
                };
            }
        };

        let Some(station_id) = record.station_id() else {
            warn!(self.logger, "station id is empty, skipping record");
            return RecordOutcome::Unidentified;
        };

        let registered = self.register_station(station_id, &record, registry).await;

        let observation = match validate_observation(station_id, &record) {
            Ok(observation) => observation,
            Err(Rejection::Incomplete(reason)) => {
                warn!(
                    self.logger,
                    "station {} data incomplete ({}), skipping observation", station_id, reason
                );
                return RecordOutcome::Skipped(reason);
            }
            Err(Rejection::Invalid(err)) => {
                let elements = record.elements();
                error!(
                    self.logger,
                    "error processing station {} data: {}", station_id, err
                );
                debug!(
                    self.logger,
                    "raw inputs - time: {:?}, temperature: {:?}, pressure: {:?}",
                    record.observed_at(),
                    elements.temperature,
                    elements.pressure
                );
                return RecordOutcome::Failed(err);
            }
        };

        if !registered {
            error!(
                self.logger,
                "station {} is not registered, dropping its observation", station_id
            );
            return RecordOutcome::Failed(RecordError::StationNotRegistered);
        }

        if self.store.upsert_observation(&observation).await {
            debug!(
                self.logger,
                "saved station {}: temperature={}°C, pressure={:?}hPa",
                station_id,
                observation.temperature,
                observation.pressure
            );
            RecordOutcome::Saved
        } else {
            RecordOutcome::Failed(RecordError::Persistence)
        }
    }

    /// Ensures the station row exists before any observation is written.
    ///
    /// Known stations only get their name refreshed from a name carried by
    /// the record itself; fallbacks never overwrite a stored name.
    async fn register_station(
        &self,
        station_id: &str,
        record: &StationRecord,
        registry: &StationRegistry,
    ) -> bool {
        if self.store.station_exists(station_id).await {
            if let Some(name) = record.station_name() {
                if !self.store.upsert_station(station_id, name).await {
                    warn!(self.logger, "could not refresh name of station {}", station_id);
                }
            }
            return true;
        }

        let name = record
            .station_name()
            .or_else(|| registry.name(station_id))
            .unwrap_or(UNKNOWN_STATION);
        if self.store.upsert_station(station_id, name).await {
            info!(self.logger, "new station added: {} - {}", station_id, name);
            true
        } else {
            error!(self.logger, "failed to add station: {} - {}", station_id, name);
            false
        }
    }
}

/// Missing values are checked before malformed ones: a record that lacks a
/// required value is skipped even if another of its values is garbage.
fn validate_observation(station_id: &str, record: &StationRecord) -> Result<Observation, Rejection> {
    let elements = record.elements();
    let temperature = Reading::classify(elements.temperature.as_ref());
    let pressure = Reading::classify(elements.pressure.as_ref());

    if temperature.is_unavailable() {
        return Err(Rejection::Incomplete(format!("{} missing", AIR_TEMPERATURE)));
    }
    if elements.requires_pressure() && pressure.is_unavailable() {
        return Err(Rejection::Incomplete(format!("{} missing", AIR_PRESSURE)));
    }
    let raw_time = record
        .observed_at()
        .ok_or_else(|| Rejection::Incomplete("observation time missing".to_string()))?;

    let temperature = reading_value(temperature, AIR_TEMPERATURE)?
        .ok_or_else(|| Rejection::Incomplete(format!("{} missing", AIR_TEMPERATURE)))?;
    let pressure = reading_value(pressure, AIR_PRESSURE)?;
    let observed_at = parse_observation_time(raw_time).map_err(|_| {
        Rejection::Invalid(RecordError::InvalidTimestamp {
            raw: raw_time.to_string(),
        })
    })?;

    Ok(Observation {
        station_id: station_id.to_string(),
        temperature,
        pressure,
        observed_at,
    })
}

fn reading_value(reading: Reading, element: &'static str) -> Result<Option<f64>, Rejection> {
    match reading {
        Reading::Value(value) => Ok(Some(value)),
        Reading::Missing | Reading::Sentinel => Ok(None),
        Reading::Invalid(raw) => Err(Rejection::Invalid(RecordError::InvalidNumber {
            element,
            raw,
        })),
    }
}
