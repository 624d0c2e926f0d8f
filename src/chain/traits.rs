use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{GlobalRewardPool, ProducerInfo};
use crate::error::Result;

/// The chain operations the claimer depends on.
///
/// Implementations fail fast: no retries inside a call. Retry policy lives in
/// the scheduler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch the producer row for `account`
    async fn query_account_info(&self, account: &str) -> Result<ProducerInfo>;

    /// Fetch the global reward buckets. An empty table is an error.
    async fn query_global_reward_pool(&self) -> Result<GlobalRewardPool>;

    /// Sign and push `claimrewards` for `account`, returning the transaction id
    async fn submit_claim(&self, account: &str) -> Result<String>;
}

/// Source of "now" for scheduling decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
