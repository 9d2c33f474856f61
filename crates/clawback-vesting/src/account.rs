//! Account variants and the vesting grant bookkeeping.
//!
//! A [`ClawbackVestingAccount`] is a Vesting Grant owned by its account
//! record. Besides the schedule it tracks how much of the account's staked
//! balance (delegated plus unbonding) is attributed to still-vesting tokens
//! (`delegated_vesting`) versus already-vested ones (`delegated_free`).
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  clawback / end_time reached  ┌─────────┐
//!   │ VESTING ├──────────────────────────────▶│ SETTLED │
//!   └─────────┘                               └─────────┘
//! ```
//!
//! SETTLED is terminal: `vesting_coins` is zero from then on.

use clawback_types::{Address, ClawbackError, Coins, Result};
use serde::{Deserialize, Serialize};

use crate::schedule;

/// A plain account with no vesting attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: Address,
}

/// An account whose balance vests linearly and whose unvested remainder can
/// be clawed back by `funder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClawbackVestingAccount {
    pub address: Address,
    /// Everything ever locked under this grant.
    pub original_vesting: Coins,
    /// Staked tokens attributed to the vesting portion.
    pub delegated_vesting: Coins,
    /// Staked tokens attributed to the vested portion.
    pub delegated_free: Coins,
    /// Seconds since epoch.
    pub start_time: i64,
    /// Seconds since epoch. Forced to the clawback time on settlement.
    pub end_time: i64,
    /// The only address allowed to claw back. `None` disables clawback.
    pub funder: Option<Address>,
}

impl ClawbackVestingAccount {
    /// Create a fresh grant.
    ///
    /// # Errors
    /// - `InvalidCoins` if `original_vesting` is empty
    /// - `InvalidSchedule` unless `start_time < end_time`
    pub fn new(
        address: Address,
        funder: Option<Address>,
        original_vesting: Coins,
        start_time: i64,
        end_time: i64,
    ) -> Result<Self> {
        if original_vesting.is_zero() {
            return Err(ClawbackError::InvalidCoins {
                reason: "original vesting is empty".into(),
            });
        }
        if start_time >= end_time {
            return Err(ClawbackError::InvalidSchedule {
                reason: format!("start {start_time} must be before end {end_time}"),
            });
        }
        Ok(Self {
            address,
            original_vesting,
            delegated_vesting: Coins::new(),
            delegated_free: Coins::new(),
            start_time,
            end_time,
            funder,
        })
    }

    #[must_use]
    pub fn vested_coins(&self, now: i64) -> Coins {
        schedule::vested_amount(&self.original_vesting, self.start_time, self.end_time, now)
    }

    #[must_use]
    pub fn vesting_coins(&self, now: i64) -> Coins {
        schedule::vesting_amount(&self.original_vesting, self.start_time, self.end_time, now)
    }

    /// Tokens that may not leave the account: vesting coins not already
    /// covered by vesting-attributed delegations.
    #[must_use]
    pub fn locked_coins(&self, now: i64) -> Coins {
        self.vesting_coins(now).saturating_sub(&self.delegated_vesting)
    }

    /// Part of `balance` that can be transferred at `now`.
    #[must_use]
    pub fn spendable(&self, balance: &Coins, now: i64) -> Coins {
        balance.saturating_sub(&self.locked_coins(now))
    }

    #[must_use]
    pub fn is_settled(&self, now: i64) -> bool {
        self.vesting_coins(now).is_zero()
    }

    #[must_use]
    pub fn is_funded_by(&self, addr: &Address) -> bool {
        self.funder.as_ref() == Some(addr)
    }

    /// Stop vesting at `now`: whatever is vested becomes the whole grant
    /// and the schedule ends immediately.
    pub fn force_complete(&mut self, now: i64) {
        let vested = self.vested_coins(now);
        tracing::debug!(
            account = %self.address,
            original = %self.original_vesting,
            vested = %vested,
            now,
            "Vesting schedule force-completed"
        );
        self.original_vesting = vested;
        self.end_time = now;
    }

    /// `delegated_vesting + delegated_free`.
    pub fn delegated(&self) -> Result<Coins> {
        self.delegated_vesting.checked_add(&self.delegated_free)
    }

    /// Record a delegation of `amount` out of `balance` (the balance before
    /// the delegation). Vesting tokens are attributed first.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if `balance` does not cover `amount`.
    pub fn track_delegation(&mut self, balance: &Coins, amount: &Coins, now: i64) -> Result<()> {
        if !balance.is_all_gte(amount) {
            return Err(ClawbackError::InsufficientFunds {
                address: self.address.clone(),
                needed: amount.clone(),
                available: balance.clone(),
            });
        }
        let vesting = self.vesting_coins(now);
        let free_vesting = vesting.saturating_sub(&self.delegated_vesting);
        let to_vesting = free_vesting.min(amount);
        let to_free = amount.checked_sub(&to_vesting)?;
        self.delegated_vesting = self.delegated_vesting.checked_add(&to_vesting)?;
        self.delegated_free = self.delegated_free.checked_add(&to_free)?;
        Ok(())
    }

    /// Record `amount` returning from staking. Free tokens are released
    /// first; anything beyond the tracked totals (slashing) is ignored.
    pub fn track_undelegation(&mut self, amount: &Coins) -> Result<()> {
        let from_free = self.delegated_free.min(amount);
        let rest = amount.checked_sub(&from_free)?;
        let from_vesting = self.delegated_vesting.min(&rest);
        self.delegated_free = self.delegated_free.checked_sub(&from_free)?;
        self.delegated_vesting = self.delegated_vesting.checked_sub(&from_vesting)?;
        Ok(())
    }
}

/// The account variants the account collaborator stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    Base(BaseAccount),
    ClawbackVesting(ClawbackVestingAccount),
}

impl Account {
    #[must_use]
    pub fn address(&self) -> &Address {
        match self {
            Self::Base(acc) => &acc.address,
            Self::ClawbackVesting(acc) => &acc.address,
        }
    }

    #[must_use]
    pub fn as_vesting(&self) -> Option<&ClawbackVestingAccount> {
        match self {
            Self::ClawbackVesting(acc) => Some(acc),
            Self::Base(_) => None,
        }
    }

    /// Coins locked at `now`; always empty for a base account.
    #[must_use]
    pub fn locked_coins(&self, now: i64) -> Coins {
        self.as_vesting()
            .map(|va| va.locked_coins(now))
            .unwrap_or_default()
    }
}
