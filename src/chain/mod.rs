mod traits;

pub use traits::{ChainClient, Clock, FixedClock, SystemClock};

#[cfg(test)]
pub use traits::MockChainClient;
