use cwa_crawler::{Cli, FetchSettings};
use serde_json::{json, Value};
use slog::{o, Discard, Logger};
use std::{fs, time::Duration};
use tempfile::TempDir;
use wiremock::MockServer;

pub const API_KEY: &str = "CWA-TEST-KEY";
pub const DATASET: &str = "O-A0001-001";

pub fn test_logger() -> Logger {
    Logger::root(Discard, o!())
}

pub fn fetch_settings(server: &MockServer, timeout: Duration) -> FetchSettings {
    FetchSettings {
        base_url: format!("{}/", server.uri()),
        dataset_id: DATASET.to_string(),
        api_key: API_KEY.to_string(),
        timeout,
        user_agent: "cwa-crawler-tests".to_string(),
    }
}

pub struct TestEnv {
    pub dir: TempDir,
    pub cli: Cli,
}

impl TestEnv {
    pub fn data_dir(&self) -> String {
        self.dir.path().join("data").to_str().unwrap().to_string()
    }

    pub fn database_file(&self) -> String {
        format!("{}/weather.sqlite", self.data_dir())
    }
}

/// Workspace with a station list and a CLI pointed at `server`.
pub fn test_env(server: &MockServer, stations: Value) -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let stations_file = dir.path().join("stations.json");
    fs::write(&stations_file, stations.to_string()).unwrap();

    let cli = Cli {
        api_key: Some(API_KEY.to_string()),
        base_url: Some(format!("{}/", server.uri())),
        dataset_id: Some(DATASET.to_string()),
        timeout: Some(1),
        stations_file: Some(stations_file.to_str().unwrap().to_string()),
        data_dir: Some(dir.path().join("data").to_str().unwrap().to_string()),
        ..Default::default()
    };
    TestEnv { dir, cli }
}

pub fn two_stations() -> Value {
    json!([
        {"StationId": "466920", "StationName": "Taipei"},
        {"StationId": "C0A520"}
    ])
}

pub fn observation_body() -> Value {
    json!({
        "success": "true",
        "records": {
            "Station": [
                {
                    "StationId": "466920",
                    "StationName": "Taipei",
                    "ObsTime": {"DateTime": "2024-05-01T12:30:00+08:00"},
                    "WeatherElement": {"AirTemperature": "28.4", "AirPressure": "1008.2"}
                },
                {
                    "StationId": "C0A520",
                    "ObsTime": {"DateTime": "2024-05-01T12:30:00+08:00"},
                    "WeatherElement": {"AirTemperature": "-999", "AirPressure": "-999"}
                }
            ]
        }
    })
}
