use cwa_crawler::{get_config_info, report, run, setup_logger};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = get_config_info();
    let logger = match setup_logger(&cli) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("failed to set up logging: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&cli, &logger).await;
    report(&logger, &result)
}
