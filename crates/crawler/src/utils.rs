use anyhow::Error;
use clap::Parser;
use cwa_weather_core::{
    create_dir_all, find_config_file, load_config, ConfigSource, DEFAULT_BASE_URL,
    DEFAULT_DATASET_ID, DEFAULT_REQUEST_TIMEOUT,
};
use slog::{o, Drain, Level, Logger};
use std::{env, fs::OpenOptions, time::Duration};
use time::{macros::format_description, OffsetDateTime};

use crate::{CrawlError, FetchSettings};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "CWA Crawler - Fetches the latest station observations and stores them in SQLite"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $CWA_CRAWLER_CONFIG, ./crawler.toml,
    /// $XDG_CONFIG_HOME/cwa-weather/crawler.toml, /etc/cwa-weather/crawler.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "CWA_CRAWLER_LEVEL")]
    pub level: Option<String>,

    /// CWA open data authorization key
    #[arg(short = 'k', long, env = "CWA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the CWA datastore REST API
    #[arg(short, long, env = "CWA_CRAWLER_BASE_URL")]
    pub base_url: Option<String>,

    /// Dataset to query, appended to the base URL
    #[arg(long, env = "CWA_CRAWLER_DATASET_ID")]
    pub dataset_id: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, env = "CWA_CRAWLER_TIMEOUT")]
    pub timeout: Option<u64>,

    /// HTTP User-Agent header for API requests
    #[arg(short, long, env = "CWA_CRAWLER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// JSON file listing the stations to crawl ([{"StationId", "StationName"}])
    #[arg(short, long, env = "CWA_CRAWLER_STATIONS_FILE")]
    pub stations_file: Option<String>,

    /// Directory holding the SQLite database
    #[arg(short, long, env = "CWA_CRAWLER_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Also write logs to a daily file in this directory
    #[arg(long, env = "CWA_CRAWLER_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn dataset_id(&self) -> String {
        self.dataset_id
            .clone()
            .unwrap_or_else(|| DEFAULT_DATASET_ID.to_string())
    }

    pub fn timeout(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("cwa-crawler/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn stations_file(&self) -> String {
        self.stations_file
            .clone()
            .unwrap_or_else(|| "./stations.json".to_string())
    }

    pub fn data_dir(&self) -> String {
        self.data_dir
            .clone()
            .unwrap_or_else(|| "./data".to_string())
    }

    /// Upstream request settings; fails when no API key is configured.
    pub fn fetch_settings(&self) -> Result<FetchSettings, CrawlError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                CrawlError::Config(
                    "an API key is required (set CWA_API_KEY, --api-key or api_key in crawler.toml)"
                        .to_string(),
                )
            })?;

        Ok(FetchSettings {
            base_url: self.base_url(),
            dataset_id: self.dataset_id(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(self.timeout()),
            user_agent: self.user_agent(),
        })
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("CWA_CRAWLER_CONFIG", "crawler.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        api_key: cli_args.api_key.or(file_config.api_key),
        base_url: cli_args.base_url.or(file_config.base_url),
        dataset_id: cli_args.dataset_id.or(file_config.dataset_id),
        timeout: cli_args.timeout.or(file_config.timeout),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
        stations_file: cli_args.stations_file.or(file_config.stations_file),
        data_dir: cli_args.data_dir.or(file_config.data_dir),
        log_dir: cli_args.log_dir.or(file_config.log_dir),
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

pub fn get_log_level(cli: &Cli) -> Level {
    match cli.level.as_ref() {
        Some(level) => parse_level(level),
        None => parse_level(&env::var("RUST_LOG").unwrap_or_default()),
    }
}

/// Terminal logger, duplicated into `weather_crawler_YYYYMMDD.log` when a log dir is set.
pub fn setup_logger(cli: &Cli) -> Result<Logger, Error> {
    let log_level = get_log_level(cli);

    let decorator = slog_term::TermDecorator::new().build();
    let term = slog_term::CompactFormat::new(decorator).build().fuse();

    let root = match cli.log_dir.as_deref() {
        Some(log_dir) => {
            create_dir_all(log_dir)?;
            let today = OffsetDateTime::now_utc().format(format_description!("[year][month][day]"))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(format!("{}/weather_crawler_{}.log", log_dir, today))?;
            let file_drain = slog_term::FullFormat::new(slog_term::PlainDecorator::new(file))
                .build()
                .fuse();
            let drain = slog::Duplicate::new(term, file_drain).fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            let drain = drain.filter_level(log_level).fuse();
            Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
        }
        None => {
            let drain = slog_async::Async::new(term).build().fuse();
            let drain = drain.filter_level(log_level).fuse();
            Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
        }
    };
    Ok(root)
}
