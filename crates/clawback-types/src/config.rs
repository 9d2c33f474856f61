//! Configuration for the clawback engine.

use serde::{Deserialize, Serialize};

use crate::{Address, ClawbackError, Result, constants};

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawbackConfig {
    /// Maximum unbonding / delegation entries enumerated per clawback.
    pub entry_limit: u16,
    /// Addresses that may not receive a new vesting grant (module
    /// accounts and the like).
    pub blocked_addresses: Vec<Address>,
    /// Upper bound on `end_time - start_time` for a new grant.
    pub max_vesting_duration_secs: i64,
}

impl Default for ClawbackConfig {
    fn default() -> Self {
        Self {
            entry_limit: constants::DEFAULT_ENTRY_LIMIT,
            blocked_addresses: Vec::new(),
            max_vesting_duration_secs: constants::DEFAULT_MAX_VESTING_DURATION_SECS,
        }
    }
}

impl ClawbackConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.entry_limit == 0 {
            return Err(ClawbackError::Configuration(
                "entry_limit must be > 0".into(),
            ));
        }
        if self.max_vesting_duration_secs <= 0 {
            return Err(ClawbackError::Configuration(format!(
                "max_vesting_duration_secs must be > 0, got {}",
                self.max_vesting_duration_secs
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_blocked(&self, addr: &Address) -> bool {
        self.blocked_addresses.contains(addr)
    }
}
