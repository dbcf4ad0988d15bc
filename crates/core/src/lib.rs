//! CWA Weather Core Library
//!
//! Shared utilities for the crawler:
//! - Configuration loading (XDG-compliant)
//! - File system utilities
//! - Upstream API defaults

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::{create_dir_all, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "cwa-weather";

/// Central Weather Administration open data REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://opendata.cwa.gov.tw/api/v1/rest/datastore/";

/// Automatic weather station observations dataset
pub const DEFAULT_DATASET_ID: &str = "O-A0001-001";

/// Default upstream request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;
