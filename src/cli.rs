use clap::{Parser, Subcommand};

use crate::domain::Eligibility;
use crate::strategy::ClaimReport;

#[derive(Parser)]
#[command(name = "autoclaim")]
#[command(version = "0.1.0")]
#[command(about = "Block-producer reward auto-claimer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and environment overrides
    #[arg(short, long, default_value = "config", env = "AUTOCLAIM_CONFIG_DIR")]
    pub config_dir: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the claim daemon (default)
    Run,
    /// Show the producer's current reward estimate without claiming
    Status,
}

/// Print a one-shot claim report to stdout
pub fn print_report(report: &ClaimReport) {
    let estimate = &report.estimate;

    println!("Producer: {}", report.producer.owner);
    println!("  Unpaid blocks:   {}", report.producer.unpaid_blocks);
    println!("  Total votes:     {}", report.producer.total_votes);
    println!("  Last claim time: {}", estimate.last_claim_time);
    println!("  Next claim time: {}", estimate.next_claim_time);
    println!();
    println!("Rewards:");
    println!("  Block pay: {}", estimate.block_pay);
    println!("  Vote pay:  {}", estimate.vote_pay);
    println!("  Total:     {}", report.total_pay());
    println!();

    match report.eligibility {
        Eligibility::Eligible => println!("\x1b[32mStatus: {}\x1b[0m", report.eligibility),
        _ => println!("\x1b[33mStatus: {}\x1b[0m", report.eligibility),
    }
}
