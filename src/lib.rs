pub mod adapters;
pub mod chain;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod strategy;

pub use adapters::FibosRpcClient;
pub use chain::{ChainClient, Clock, SystemClock};
pub use config::AppConfig;
pub use domain::{
    estimate_rewards, ClaimStage, CycleOutcome, Eligibility, GlobalRewardPool, ProducerInfo,
    RewardEstimate,
};
pub use error::{ClaimerError, EstimationError, Result};
pub use strategy::{AutoClaimer, ClaimReport, ClaimerConfig};
