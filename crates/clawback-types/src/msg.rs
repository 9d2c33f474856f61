//! Requests accepted by the engine and the result it reports back.

use serde::{Deserialize, Serialize};

use crate::{Address, ClawbackError, Coins, Result};

/// Create a vesting grant: move `amount` from `funder` into a new account at
/// `to_address` that vests linearly between `start_time` and `end_time`.
/// A missing `start_time` means "the current block time".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateClawbackVestingAccount {
    pub funder: Address,
    pub to_address: Address,
    pub amount: Coins,
    pub start_time: Option<i64>,
    pub end_time: i64,
}

impl MsgCreateClawbackVestingAccount {
    /// Stateless checks.
    pub fn validate_basic(&self) -> Result<()> {
        if self.amount.is_zero() {
            return Err(ClawbackError::InvalidCoins {
                reason: "grant amount is empty".into(),
            });
        }
        if self.end_time <= 0 {
            return Err(ClawbackError::InvalidSchedule {
                reason: format!("end time {} must be positive", self.end_time),
            });
        }
        if let Some(start) = self.start_time {
            if start < 0 || start >= self.end_time {
                return Err(ClawbackError::InvalidSchedule {
                    reason: format!("start {start} must be in [0, end {})", self.end_time),
                });
            }
        }
        Ok(())
    }
}

/// Recover the unvested remainder of `account`'s grant. The amount is never
/// chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClawback {
    pub funder: Address,
    pub account: Address,
}

impl MsgClawback {
    /// Stateless checks. Address syntax is already enforced by [`Address`].
    pub fn validate_basic(&self) -> Result<()> {
        if self.funder == self.account {
            return Err(ClawbackError::InvalidAddress {
                reason: format!("{} cannot claw back from itself", self.funder),
            });
        }
        Ok(())
    }
}

/// What a clawback recovered, per fund pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClawbackResult {
    /// Taken from the account's spendable balance.
    pub liquid: Coins,
    /// Taken from unbonding entries.
    pub unbonding: Coins,
    /// Taken from active delegations.
    pub delegated: Coins,
}

impl ClawbackResult {
    /// Sum over all three pools.
    pub fn total(&self) -> Result<Coins> {
        self.liquid
            .checked_add(&self.unbonding)?
            .checked_add(&self.delegated)
    }
}
