use autoclaim::adapters::FibosRpcClient;
use autoclaim::cli::print_report;
use autoclaim::config::AppConfig;
use autoclaim::error::Result;
use autoclaim::strategy::{AutoClaimer, ClaimerConfig};
use tracing::info;

use crate::main_runtime::shutdown_signal;

fn build_claimer(config: &AppConfig) -> Result<AutoClaimer<FibosRpcClient>> {
    let client = FibosRpcClient::from_config(config)?;
    Ok(AutoClaimer::new(
        client,
        ClaimerConfig::new(config.chain.account.clone()),
    ))
}

pub async fn run_claimer(config: &AppConfig) -> Result<()> {
    info!(
        "Starting auto-claimer (account={}, endpoint={}, chain_id={})",
        config.chain.account, config.chain.http_endpoint, config.chain.chain_id
    );

    let claimer = build_claimer(config)?;

    tokio::select! {
        _ = claimer.run() => {},
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping auto-claimer");
        }
    }

    Ok(())
}

pub async fn run_status(config: &AppConfig) -> Result<()> {
    let claimer = build_claimer(config)?;
    let report = claimer.report().await?;
    print_report(&report);
    Ok(())
}
