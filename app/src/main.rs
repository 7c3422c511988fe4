use std::process::ExitCode;

use task_app::{run_stdio, AppConfig, AppError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "task-app failed");
            ExitCode::FAILURE
        }
    }
}

fn start() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    info!(base_url = %config.base_url, timeout = ?config.timeout, "starting task list");
    run_stdio(&config)?;
    Ok(())
}
