//! Block execution context supplied by the host.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClawbackError, Result};

/// The block a transaction executes in. Every time-dependent computation in
/// one transaction reads the same `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockContext {
    #[must_use]
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Build a context from a unix timestamp in seconds.
    pub fn at_unix(height: u64, secs: i64) -> Result<Self> {
        let time = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| ClawbackError::InvalidSchedule {
                reason: format!("timestamp {secs} out of range"),
            })?;
        Ok(Self { height, time })
    }

    /// Block time in seconds since the unix epoch.
    #[must_use]
    pub fn unix(&self) -> i64 {
        self.time.timestamp()
    }
}
