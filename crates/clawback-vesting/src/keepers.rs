//! Capabilities the clawback engine consumes from its host.
//!
//! The engine never owns balances, delegations or accounts. It reads them
//! fresh through these traits on every call and writes back only the grant
//! and the transfers it decides on. Calls are synchronous and in-process.

use clawback_types::{Address, Amount, Coins, Denom, Result, Shares, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::Account;

// ---------------------------------------------------------------------------
// Staking records
// ---------------------------------------------------------------------------

/// A validator as reported by the staking collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: ValidatorAddress,
    /// Bonded tokens backing the validator's shares.
    pub tokens: Amount,
    /// Total shares issued to delegators.
    pub delegator_shares: Shares,
}

/// Shares held by `delegator` with `validator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: ValidatorAddress,
    pub shares: Shares,
}

/// One pending unbonding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    pub creation_height: u64,
    /// Seconds since epoch at which the tokens return to the delegator.
    pub completion_time: i64,
    pub initial_balance: Amount,
    /// What is left after slashing and transfers.
    pub balance: Amount,
}

/// All pending unbondings of `delegator` with `validator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator: Address,
    pub validator: ValidatorAddress,
    pub entries: Vec<UnbondingEntry>,
}

impl UnbondingDelegation {
    /// Sum of entry balances.
    #[must_use]
    pub fn balance(&self) -> Amount {
        self.entries
            .iter()
            .fold(0, |acc: Amount, e| acc.saturating_add(e.balance))
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Account storage, polymorphic over [`Account`] variants.
pub trait AccountKeeper {
    fn account(&self, addr: &Address) -> Option<Account>;

    fn set_account(&mut self, account: Account);
}

/// Liquid balances and conservation-preserving transfers.
pub trait BankKeeper {
    /// Balance that may leave the account now (vesting locks applied).
    fn spendable_balance(&self, addr: &Address) -> Coins;

    fn all_balances(&self, addr: &Address) -> Coins;

    fn send_enabled(&self, denom: &str) -> bool;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Fails without moving anything if `amount` exceeds `from`'s spendable
    /// balance in any denomination or a denomination is send-disabled.
    fn transfer(&mut self, from: &Address, to: &Address, amount: &Coins) -> Result<()>;
}

/// Delegations, unbondings and share accounting.
pub trait StakingKeeper {
    fn bond_denom(&self) -> Denom;

    /// Tokens currently delegated by `delegator`, across validators.
    fn bonded_amount(&self, delegator: &Address) -> Result<Amount>;

    /// Tokens currently unbonding for `delegator`, across validators.
    fn unbonding_amount(&self, delegator: &Address) -> Result<Amount>;

    /// At most `limit` unbonding delegations, in the keeper's native order.
    fn unbonding_delegations(&self, delegator: &Address, limit: u16) -> Vec<UnbondingDelegation>;

    /// At most `limit` delegations, in the keeper's native order.
    fn delegations(&self, delegator: &Address, limit: u16) -> Vec<Delegation>;

    fn validator(&self, addr: &ValidatorAddress) -> Option<Validator>;

    /// Shares worth at most `tokens`, truncated. Zero when the validator
    /// has no tokens left behind its shares. Never rounds up, so
    /// `tokens_for_shares_round_up(shares_for_tokens_truncated(t)) <= t`.
    fn shares_for_tokens_truncated(&self, validator: &Validator, tokens: Amount)
    -> Result<Shares>;

    /// Tokens worth `shares`, rounded up.
    fn tokens_for_shares_round_up(&self, validator: &Validator, shares: Shares)
    -> Result<Amount>;

    /// Move up to `want` unbonding tokens held by `from` with `validator` to
    /// `to`. Returns the amount actually moved, which may be less.
    fn transfer_unbonding(
        &mut self,
        from: &Address,
        to: &Address,
        validator: &ValidatorAddress,
        want: Amount,
    ) -> Result<Amount>;

    /// Move up to `want_shares` of `from`'s delegation with `validator` to
    /// `to`. Returns the shares actually moved.
    fn transfer_delegation(
        &mut self,
        from: &Address,
        to: &Address,
        validator: &ValidatorAddress,
        want_shares: Shares,
    ) -> Result<Shares>;
}

/// Everything the engine needs from one host.
pub trait Host: AccountKeeper + BankKeeper + StakingKeeper {}

impl<T: AccountKeeper + BankKeeper + StakingKeeper> Host for T {}
