use reqwest::Client;
use slog::{debug, error, info, Logger};
use std::time::Duration;

use crate::{CrawlError, FetchError, RawResponse};

/// Element selector sent with every request.
pub const WEATHER_ELEMENTS: &str = "AirTemperature,AirPressure";

#[derive(Clone, Debug)]
pub struct FetchSettings {
    pub base_url: String,
    pub dataset_id: String,
    pub api_key: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchSettings {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.dataset_id)
    }
}

pub struct JsonFetcher {
    logger: Logger,
    client: Client,
    settings: FetchSettings,
}

impl JsonFetcher {
    pub fn new(logger: Logger, settings: FetchSettings) -> Result<JsonFetcher, CrawlError> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("error building http client: {}", e)))?;
        Ok(Self {
            logger,
            client,
            settings,
        })
    }

    /// Single request for the latest observations of `station_ids`; no retries.
    pub async fn fetch(&self, station_ids: &[String]) -> Result<RawResponse, CrawlError> {
        if station_ids.is_empty() {
            error!(self.logger, "refusing to query the API without a station filter");
            return Err(CrawlError::NoStations(
                "station id list is empty".to_string(),
            ));
        }

        let url = self.settings.url();
        info!(
            self.logger,
            "fetching observations for {} stations", station_ids.len()
        );
        debug!(self.logger, "requesting: {}", url);

        let station_filter = station_ids.join(",");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("Authorization", self.settings.api_key.as_str()),
                ("StationId", station_filter.as_str()),
                ("WeatherElement", WEATHER_ELEMENTS),
            ])
            .send()
            .await
            .map_err(|e| self.failed(FetchError::from(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failed(FetchError::Status { status }));
        }

        let body: RawResponse = response
            .json()
            .await
            .map_err(|e| self.failed(FetchError::from(e)))?;
        info!(
            self.logger,
            "API responded with {} station records",
            body.records().len()
        );
        Ok(body)
    }

    fn failed(&self, err: FetchError) -> CrawlError {
        error!(self.logger, "API request error: {}", err);
        CrawlError::Fetch(err)
    }
}
