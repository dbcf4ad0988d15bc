use slog::{error, info, warn, Logger};
use std::{process::ExitCode, sync::Arc};

use crate::{
    Cli, CrawlError, Database, IngestSummary, JsonFetcher, ObservationIngestor, StationRegistry,
};

/// One crawl: fetch the latest observations for the configured stations and
/// store them.
///
/// The database is only opened once the API has answered, so a failed fetch
/// leaves the store untouched. Record level failures end up in the summary;
/// only configuration, station list, fetch and connection problems are errors.
pub async fn run(cli: &Cli, logger: &Logger) -> Result<IngestSummary, CrawlError> {
    let settings = cli.fetch_settings()?;
    info!(logger, "CWA crawler starting...");
    info!(logger, "  API endpoint: {}", settings.url());
    info!(logger, "  Stations file: {}", cli.stations_file());
    info!(logger, "  Data dir: {}", cli.data_dir());

    let registry = StationRegistry::load(&cli.stations_file())?;
    info!(logger, "loaded {} stations to crawl", registry.len());

    let fetcher = JsonFetcher::new(logger.clone(), settings)?;
    let raw = fetcher.fetch(registry.ids()).await?;

    let db = Arc::new(
        Database::connect(&cli.data_dir(), logger.clone())
            .await
            .map_err(CrawlError::Database)?,
    );
    let ingestor = ObservationIngestor::new(logger.clone(), db.clone());
    let summary = ingestor.ingest(&raw, &registry).await;
    db.close().await;

    if summary.is_success() {
        info!(
            logger,
            "crawl finished: {} of {} records saved",
            summary.saved,
            summary.total
        );
    } else {
        warn!(
            logger,
            "crawl finished without storing anything ({} records, {} errors)",
            summary.total,
            summary.errors
        );
    }
    Ok(summary)
}

/// Logs the outcome of a run once and maps it to the process exit status.
pub fn report(logger: &Logger, result: &Result<IngestSummary, CrawlError>) -> ExitCode {
    match result {
        Ok(summary) => {
            info!(
                logger,
                "summary - total: {}, saved: {}, skipped: {}, without id: {}, errors: {}",
                summary.total,
                summary.saved,
                summary.skipped,
                summary.unidentified,
                summary.errors
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(logger, "crawl failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
