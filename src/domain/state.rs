use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Delay after any failed query, estimation or submission.
pub const RETRY_DELAY: Duration = Duration::from_secs(10);
/// Delay when the reward is below the claim threshold.
pub const BELOW_THRESHOLD_DELAY: Duration = Duration::from_secs(30 * 60);
/// Delay after a successful claim.
pub const CLAIMED_DELAY: Duration = Duration::from_secs(24 * 60 * 60);
/// Minimum total reward worth claiming, in whole asset units.
pub const MIN_CLAIM_AMOUNT: Decimal = dec!(1000);

/// Stages of one claim attempt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStage {
    /// Fetching the producer row
    Querying,
    /// Fetching the global reward buckets
    QueryingGlobal,
    /// Computing the reward estimate
    Estimating,
    /// Checking claim time and amount
    Evaluating,
    /// Submitting `claimrewards`
    Claiming,
}

impl ClaimStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStage::Querying => "QUERYING",
            ClaimStage::QueryingGlobal => "QUERYING_GLOBAL",
            ClaimStage::Estimating => "ESTIMATING",
            ClaimStage::Evaluating => "EVALUATING",
            ClaimStage::Claiming => "CLAIMING",
        }
    }
}

impl fmt::Display for ClaimStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a claim attempt cycle ended. Every variant maps to exactly one delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    ProducerQueryFailed { reason: String },
    GlobalQueryFailed { reason: String },
    EstimationFailed { reason: String },
    /// Claim window not open yet
    TooEarly { wait: Duration },
    BelowThreshold { total_pay: Decimal },
    ClaimFailed { reason: String },
    Claimed { tx_id: String },
}

impl CycleOutcome {
    /// Delay before the next cycle starts
    pub fn delay(&self) -> Duration {
        match self {
            CycleOutcome::ProducerQueryFailed { .. }
            | CycleOutcome::GlobalQueryFailed { .. }
            | CycleOutcome::EstimationFailed { .. }
            | CycleOutcome::ClaimFailed { .. } => RETRY_DELAY,
            CycleOutcome::TooEarly { wait } => *wait,
            CycleOutcome::BelowThreshold { .. } => BELOW_THRESHOLD_DELAY,
            CycleOutcome::Claimed { .. } => CLAIMED_DELAY,
        }
    }

    /// Stage at which the cycle stopped
    pub fn stage(&self) -> ClaimStage {
        match self {
            CycleOutcome::ProducerQueryFailed { .. } => ClaimStage::Querying,
            CycleOutcome::GlobalQueryFailed { .. } => ClaimStage::QueryingGlobal,
            CycleOutcome::EstimationFailed { .. } => ClaimStage::Estimating,
            CycleOutcome::TooEarly { .. } | CycleOutcome::BelowThreshold { .. } => {
                ClaimStage::Evaluating
            }
            CycleOutcome::ClaimFailed { .. } | CycleOutcome::Claimed { .. } => ClaimStage::Claiming,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CycleOutcome::ProducerQueryFailed { .. }
                | CycleOutcome::GlobalQueryFailed { .. }
                | CycleOutcome::EstimationFailed { .. }
                | CycleOutcome::ClaimFailed { .. }
        )
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::ProducerQueryFailed { reason } => {
                write!(f, "producer query failed: {}", reason)
            }
            CycleOutcome::GlobalQueryFailed { reason } => {
                write!(f, "global info query failed: {}", reason)
            }
            CycleOutcome::EstimationFailed { reason } => {
                write!(f, "reward estimation failed: {}", reason)
            }
            CycleOutcome::TooEarly { wait } => {
                write!(f, "not time to claim, {:.3}s remaining", wait.as_secs_f64())
            }
            CycleOutcome::BelowThreshold { total_pay } => {
                write!(f, "rewards {} below {}", total_pay, MIN_CLAIM_AMOUNT)
            }
            CycleOutcome::ClaimFailed { reason } => write!(f, "claim failed: {}", reason),
            CycleOutcome::Claimed { tx_id } => write!(f, "claimed in tx {}", tx_id),
        }
    }
}

/// Eligibility verdict for a reward estimate at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    TooEarly { wait: Duration },
    BelowThreshold,
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible => write!(f, "eligible"),
            Eligibility::TooEarly { wait } => {
                write!(f, "too early ({:.3}s remaining)", wait.as_secs_f64())
            }
            Eligibility::BelowThreshold => write!(f, "below {} threshold", MIN_CLAIM_AMOUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(ClaimStage::Querying.to_string(), "QUERYING");
        assert_eq!(ClaimStage::QueryingGlobal.as_str(), "QUERYING_GLOBAL");
        assert_eq!(ClaimStage::Claiming.as_str(), "CLAIMING");
    }

    #[test]
    fn test_failures_share_retry_floor() {
        let failures = [
            CycleOutcome::ProducerQueryFailed { reason: "x".into() },
            CycleOutcome::GlobalQueryFailed { reason: "x".into() },
            CycleOutcome::EstimationFailed { reason: "x".into() },
            CycleOutcome::ClaimFailed { reason: "x".into() },
        ];

        for outcome in failures {
            assert!(outcome.is_failure());
            assert_eq!(outcome.delay(), Duration::from_secs(10));
        }
    }

    #[test]
    fn test_outcome_delays() {
        let wait = Duration::from_millis(1_234_567);
        assert_eq!(CycleOutcome::TooEarly { wait }.delay(), wait);
        assert_eq!(
            CycleOutcome::BelowThreshold {
                total_pay: dec!(999.9999)
            }
            .delay(),
            Duration::from_secs(1800)
        );
        assert_eq!(
            CycleOutcome::Claimed {
                tx_id: "abc".into()
            }
            .delay(),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_outcome_stage() {
        assert_eq!(
            CycleOutcome::BelowThreshold {
                total_pay: dec!(1)
            }
            .stage(),
            ClaimStage::Evaluating
        );
        assert_eq!(
            CycleOutcome::ClaimFailed { reason: "x".into() }.stage(),
            ClaimStage::Claiming
        );
    }
}
