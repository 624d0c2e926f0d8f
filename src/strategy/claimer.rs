//! Auto-claimer for block-producer rewards
//!
//! Each cycle reads the producer row and the global reward buckets, estimates
//! the claimable reward and submits `claimrewards` once the claim window is
//! open and the amount is worth it. Every outcome, including failures, ends in
//! a single delay before the next cycle; nothing runs concurrently.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::chain::{ChainClient, Clock, SystemClock};
use crate::domain::{
    estimate_rewards, ClaimStage, CycleOutcome, Eligibility, ProducerInfo, RewardEstimate,
    MIN_CLAIM_AMOUNT,
};
use crate::error::Result;

/// Auto-claimer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimerConfig {
    /// Producer account whose rewards are claimed
    pub account: String,
}

impl ClaimerConfig {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

/// One-shot view of the producer's reward state
#[derive(Debug, Clone)]
pub struct ClaimReport {
    pub producer: ProducerInfo,
    pub estimate: RewardEstimate,
    pub eligibility: Eligibility,
}

impl ClaimReport {
    pub fn total_pay(&self) -> Decimal {
        self.estimate.total_pay
    }
}

/// Decide whether `estimate` can be claimed at `now`.
///
/// The wait is exact to the millisecond; the amount check is strict, so a
/// reward of exactly the minimum is claimable.
pub fn evaluate_eligibility(estimate: &RewardEstimate, now: DateTime<Utc>) -> Eligibility {
    if now < estimate.next_claim_time {
        let wait = (estimate.next_claim_time - now)
            .to_std()
            .unwrap_or(Duration::ZERO);
        return Eligibility::TooEarly { wait };
    }
    if estimate.total_pay < MIN_CLAIM_AMOUNT {
        return Eligibility::BelowThreshold;
    }
    Eligibility::Eligible
}

/// Reward claim scheduler
pub struct AutoClaimer<C, K = SystemClock> {
    client: C,
    clock: K,
    config: ClaimerConfig,
}

impl<C: ChainClient> AutoClaimer<C, SystemClock> {
    /// Create a new auto-claimer driven by the wall clock
    pub fn new(client: C, config: ClaimerConfig) -> Self {
        Self::with_clock(client, config, SystemClock)
    }
}

impl<C: ChainClient, K: Clock> AutoClaimer<C, K> {
    pub fn with_clock(client: C, config: ClaimerConfig, clock: K) -> Self {
        Self {
            client,
            clock,
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run claim cycles forever, sleeping for each outcome's delay in between
    pub async fn run(&self) {
        info!("Starting AutoClaimer for producer {}", self.config.account);

        loop {
            let outcome = self.run_cycle().await;
            let delay = outcome.delay();
            Self::log_outcome(&outcome, delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Execute one attempt cycle and report how it ended
    pub async fn run_cycle(&self) -> CycleOutcome {
        let account = self.config.account.as_str();

        info!(stage = %ClaimStage::Querying, "Fetching producer info for {}", account);
        let producer = match self.client.query_account_info(account).await {
            Ok(producer) => producer,
            Err(e) => {
                return CycleOutcome::ProducerQueryFailed {
                    reason: e.to_string(),
                }
            }
        };

        info!(stage = %ClaimStage::QueryingGlobal, "Fetching global reward pool");
        let global = match self.client.query_global_reward_pool().await {
            Ok(global) => global,
            Err(e) => {
                return CycleOutcome::GlobalQueryFailed {
                    reason: e.to_string(),
                }
            }
        };

        let estimate = match estimate_rewards(&producer, &global) {
            Ok(estimate) => estimate,
            Err(e) => {
                return CycleOutcome::EstimationFailed {
                    reason: e.to_string(),
                }
            }
        };
        Self::log_estimate(&estimate);

        match evaluate_eligibility(&estimate, self.clock.now()) {
            Eligibility::TooEarly { wait } => return CycleOutcome::TooEarly { wait },
            Eligibility::BelowThreshold => {
                return CycleOutcome::BelowThreshold {
                    total_pay: estimate.total_pay,
                }
            }
            Eligibility::Eligible => {}
        }

        info!(
            stage = %ClaimStage::Claiming,
            "Claiming {} for {}",
            estimate.total_pay,
            account
        );
        match self.client.submit_claim(account).await {
            Ok(tx_id) => CycleOutcome::Claimed { tx_id },
            Err(e) => CycleOutcome::ClaimFailed {
                reason: e.to_string(),
            },
        }
    }

    /// Query and evaluate without submitting anything
    pub async fn report(&self) -> Result<ClaimReport> {
        let producer = self
            .client
            .query_account_info(&self.config.account)
            .await?;
        let global = self.client.query_global_reward_pool().await?;
        let estimate = estimate_rewards(&producer, &global)?;
        let eligibility = evaluate_eligibility(&estimate, self.clock.now());

        Ok(ClaimReport {
            producer,
            estimate,
            eligibility,
        })
    }

    fn log_estimate(estimate: &RewardEstimate) {
        info!(stage = %ClaimStage::Estimating, "Last claim time: {}", estimate.last_claim_time);
        info!(stage = %ClaimStage::Estimating, "Next claim time: {}", estimate.next_claim_time);
        info!(
            stage = %ClaimStage::Evaluating,
            block_pay = %estimate.block_pay,
            vote_pay = %estimate.vote_pay,
            total_pay = %estimate.total_pay,
            "Rewards info"
        );
    }

    fn log_outcome(outcome: &CycleOutcome, delay: Duration) {
        let stage = outcome.stage();
        match outcome {
            CycleOutcome::Claimed { tx_id } => info!(
                %stage,
                "Claim success (tx {}), next attempt in {}s",
                tx_id,
                delay.as_secs()
            ),
            CycleOutcome::TooEarly { .. } => info!(
                %stage,
                "It is not time to claim, retry in {:.3}s",
                delay.as_secs_f64()
            ),
            CycleOutcome::BelowThreshold { total_pay } => warn!(
                %stage,
                "Rewards {} less than {}, retry in {}s",
                total_pay,
                MIN_CLAIM_AMOUNT,
                delay.as_secs()
            ),
            failure => error!(%stage, "{}, retry in {}s", failure, delay.as_secs()),
        }
    }
}
