use reqwest::StatusCode;

/// Errors that abort a crawl run.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no stations available: {0}")]
    NoStations(String),
    #[error("failed to fetch observations: {0}")]
    Fetch(#[from] FetchError),
    #[error("database unavailable: {0}")]
    Database(anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("connection failed: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("unexpected response status: {status}")]
    Status { status: StatusCode },
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else if err.is_connect() {
            FetchError::Connection(err)
        } else if err.is_decode() {
            FetchError::Decode(err)
        } else {
            FetchError::Request(err)
        }
    }
}

/// Failure of a single record; counted and logged, never fatal to the run.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record could not be decoded: {0}")]
    Malformed(String),
    #[error("{element} is not numeric: {raw:?}")]
    InvalidNumber { element: &'static str, raw: String },
    #[error("unparseable observation time: {raw:?}")]
    InvalidTimestamp { raw: String },
    #[error("station could not be registered")]
    StationNotRegistered,
    #[error("observation write failed")]
    Persistence,
}
