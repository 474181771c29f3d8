//! Block execution context handed in by the host chain.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Height and timestamp of the block being executed.
///
/// Every message handler and every settlement pass reads "now" from here,
/// never from the wall clock, so replays are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub height: u64,
    pub block_time: DateTime<Utc>,
}

impl Context {
    #[must_use]
    pub fn new(height: u64, block_time: DateTime<Utc>) -> Self {
        Self { height, block_time }
    }

    /// Context of the next block, `elapsed` later.
    #[must_use]
    pub fn advance(self, elapsed: Duration) -> Self {
        Self {
            height: self.height + 1,
            block_time: self.block_time + elapsed,
        }
    }
}
