//! Reward estimation
//!
//! Converts a producer row and the global reward buckets into the amount the
//! producer would receive from `claimrewards` right now. Pure and deterministic.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;

use super::producer::{GlobalRewardPool, ProducerInfo};
use crate::error::EstimationError;

/// Bucket amounts are stored in the smallest asset unit (4 decimals on chain).
pub const REWARD_SCALING_FACTOR: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Fractional digits of the reward asset.
pub const REWARD_DECIMALS: u32 = 4;

/// Chain-enforced minimum time between two claims (86 400 000 ms).
pub const CLAIM_INTERVAL_MS: i64 = 86_400_000;

/// Snapshot of claimable rewards for one producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardEstimate {
    pub block_pay: Decimal,
    pub vote_pay: Decimal,
    pub total_pay: Decimal,
    pub last_claim_time: DateTime<Utc>,
    pub next_claim_time: DateTime<Utc>,
}

impl fmt::Display for RewardEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block_pay={} vote_pay={} total_pay={}",
            self.block_pay, self.vote_pay, self.total_pay
        )
    }
}

/// Estimate the claimable reward for `producer` against the global buckets.
pub fn estimate_rewards(
    producer: &ProducerInfo,
    global: &GlobalRewardPool,
) -> Result<RewardEstimate, EstimationError> {
    if global.total_unpaid_blocks == 0 {
        return Err(EstimationError::DivisionUndefined {
            field: "total_unpaid_blocks",
        });
    }
    if global.total_producer_vote_weight.is_zero() {
        return Err(EstimationError::DivisionUndefined {
            field: "total_producer_vote_weight",
        });
    }

    let block_pay = share(
        global.perblock_bucket,
        Decimal::from(producer.unpaid_blocks),
        Decimal::from(global.total_unpaid_blocks),
        "block_pay",
    )?;
    let vote_pay = share(
        global.pervote_bucket,
        producer.total_votes,
        global.total_producer_vote_weight,
        "vote_pay",
    )?;
    let total_pay = block_pay
        .checked_add(vote_pay)
        .ok_or(EstimationError::Overflow { field: "total_pay" })?;

    Ok(RewardEstimate {
        block_pay,
        vote_pay,
        total_pay,
        last_claim_time: producer.last_claim_time,
        next_claim_time: next_claim_time(producer.last_claim_time),
    })
}

/// Earliest instant the chain accepts another claim.
pub fn next_claim_time(last_claim_time: DateTime<Utc>) -> DateTime<Utc> {
    last_claim_time + Duration::milliseconds(CLAIM_INTERVAL_MS)
}

/// `weight / total * bucket / scaling`, rounded to the asset precision.
///
/// The ratio is taken first: vote weights reach 1e20 and beyond, and
/// `bucket * weight` would not fit in a `Decimal`.
fn share(
    bucket: Decimal,
    weight: Decimal,
    total: Decimal,
    field: &'static str,
) -> Result<Decimal, EstimationError> {
    let overflow = EstimationError::Overflow { field };
    let raw = weight
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(bucket))
        .and_then(|v| v.checked_div(REWARD_SCALING_FACTOR))
        .ok_or(overflow)?;

    let mut pay =
        raw.round_dp_with_strategy(REWARD_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    // Fixed four-digit scale so the value prints the way the chain formats assets.
    pay.rescale(REWARD_DECIMALS);
    Ok(pay)
}
