use cwa_weather_core::path_exists;
use serde::Deserialize;
use std::{collections::HashMap, fs};

use crate::CrawlError;

/// Entry of the station reference list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StationRef {
    pub station_id: String,
    #[serde(default)]
    pub station_name: Option<String>,
}

/// Stations to crawl, in file order, with their reference names.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    ids: Vec<String>,
    names: HashMap<String, String>,
}

impl StationRegistry {
    pub fn new(stations: impl IntoIterator<Item = StationRef>) -> Self {
        let mut registry = StationRegistry::default();
        for station in stations {
            let id = station.station_id.trim();
            if id.is_empty() || registry.contains(id) {
                continue;
            }
            registry.ids.push(id.to_string());
            if let Some(name) = station.station_name.filter(|n| !n.trim().is_empty()) {
                registry.names.insert(id.to_string(), name);
            }
        }
        registry
    }

    /// Reads a JSON array of `{"StationId", "StationName"}` objects.
    ///
    /// An unreadable file and an empty list are both `NoStations`: the API
    /// must never be queried without a station filter.
    pub fn load(path: &str) -> Result<Self, CrawlError> {
        if !path_exists(path) {
            return Err(CrawlError::NoStations(format!(
                "station list not found: {}",
                path
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| {
            CrawlError::NoStations(format!("error reading station list {}: {}", path, e))
        })?;
        let stations: Vec<StationRef> = serde_json::from_str(&content).map_err(|e| {
            CrawlError::NoStations(format!("error parsing station list {}: {}", path, e))
        })?;

        let registry = StationRegistry::new(stations);
        if registry.is_empty() {
            return Err(CrawlError::NoStations(format!(
                "station list {} is empty",
                path
            )));
        }
        Ok(registry)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn name(&self, station_id: &str) -> Option<&str> {
        self.names.get(station_id).map(String::as_str)
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.ids.iter().any(|id| id == station_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
