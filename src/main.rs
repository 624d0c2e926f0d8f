use autoclaim::cli::{Cli, Commands};
use autoclaim::config::AppConfig;
use autoclaim::error::{ClaimerError, Result};
use clap::Parser;

mod main_modes;
mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    config
        .validate()
        .map_err(|errors| ClaimerError::Validation(errors.join("; ")))?;

    match &cli.command {
        Some(Commands::Status) => {
            main_runtime::init_logging_simple();
            main_modes::run_status(&config).await?;
        }
        Some(Commands::Run) | None => {
            main_runtime::init_logging(&config.logging);
            main_modes::run_claimer(&config).await?;
        }
    }

    Ok(())
}
