//! # Wallet Actions
//!
//! Thin entry point: configuration, logging, then the command.

use clap::Parser;
use lib_core::config::{core_config, init_config};
use lib_core::AppError;
use std::process::ExitCode;
use tracing::error;
use wallet_actions::{cli, logging, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_config().map_err(AppError::Config)?;
    let config = core_config();
    let _log_guard = logging::init(config)?;

    if let Err(err) = cli::run(cli, config).await {
        if cli::already_reported(&err) {
            return Ok(ExitCode::FAILURE);
        }
        let message = match err.downcast_ref::<AppError>() {
            Some(app_error) => {
                error!(code = app_error.code(), error = %app_error, "Command failed");
                app_error.user_message()
            }
            None => {
                error!(error = %err, "Command failed");
                err.to_string()
            }
        };
        eprintln!("Error: {}", message);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
