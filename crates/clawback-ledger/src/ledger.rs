//! The ledger state, block context, account storage and transactions.

use std::collections::{BTreeMap, BTreeSet};

use clawback_types::{
    Address, Amount, BlockContext, ClawbackError, Coins, Denom, Result, ValidatorAddress,
    coins::validate_denom,
};
use clawback_vesting::{
    Account, AccountKeeper, BaseAccount, Delegation, UnbondingDelegation, Validator,
};

use crate::supply::SupplyConservation;

/// Default time an unbonding takes to mature (21 days).
pub const DEFAULT_UNBONDING_PERIOD_SECS: i64 = 21 * 24 * 60 * 60;

/// In-memory chain state implementing the bank, staking and account
/// capabilities.
///
/// Maps are `BTreeMap`s so enumeration order (and therefore clawback drain
/// order) is the same on every run.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) block: BlockContext,
    pub(crate) bond_denom: Denom,
    pub(crate) unbonding_period_secs: i64,
    pub(crate) accounts: BTreeMap<Address, Account>,
    pub(crate) balances: BTreeMap<Address, Coins>,
    pub(crate) send_disabled: BTreeSet<Denom>,
    pub(crate) validators: BTreeMap<ValidatorAddress, Validator>,
    pub(crate) delegations: BTreeMap<(Address, ValidatorAddress), Delegation>,
    pub(crate) unbondings: BTreeMap<(Address, ValidatorAddress), UnbondingDelegation>,
    pub(crate) supply: SupplyConservation,
}

impl Ledger {
    /// Empty ledger at height 0, unix time 0.
    pub fn new(bond_denom: &str) -> Result<Self> {
        validate_denom(bond_denom)?;
        Ok(Self {
            block: BlockContext::at_unix(0, 0)?,
            bond_denom: bond_denom.to_string(),
            unbonding_period_secs: DEFAULT_UNBONDING_PERIOD_SECS,
            accounts: BTreeMap::new(),
            balances: BTreeMap::new(),
            send_disabled: BTreeSet::new(),
            validators: BTreeMap::new(),
            delegations: BTreeMap::new(),
            unbondings: BTreeMap::new(),
            supply: SupplyConservation::new(),
        })
    }

    #[must_use]
    pub fn with_unbonding_period(mut self, secs: i64) -> Self {
        self.unbonding_period_secs = secs;
        self
    }

    pub fn begin_block(&mut self, ctx: BlockContext) {
        self.block = ctx;
    }

    /// Start the next block at unix time `secs`.
    pub fn advance_to(&mut self, secs: i64) -> Result<BlockContext> {
        if secs < self.now() {
            return Err(ClawbackError::InvalidSchedule {
                reason: format!("block time {secs} precedes current {}", self.now()),
            });
        }
        let ctx = BlockContext::at_unix(self.block.height + 1, secs)?;
        self.begin_block(ctx);
        Ok(ctx)
    }

    #[must_use]
    pub fn block(&self) -> BlockContext {
        self.block
    }

    /// Current block time in seconds.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.block.unix()
    }

    /// Store a base account if nothing is stored at `addr` yet.
    pub fn ensure_account(&mut self, addr: &Address) {
        self.accounts
            .entry(addr.clone())
            .or_insert_with(|| Account::Base(BaseAccount {
                address: addr.clone(),
            }));
    }

    /// Run `tx` atomically: any error restores the ledger to its state
    /// before the call.
    pub fn execute<T>(&mut self, tx: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        match tx(self) {
            Ok(out) => Ok(out),
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(
                        height = self.block.height,
                        code = err.code(),
                        error = %err,
                        "Transaction aborted on invariant violation, rolling back"
                    );
                } else {
                    tracing::debug!(
                        height = self.block.height,
                        code = err.code(),
                        "Transaction rejected, rolling back"
                    );
                }
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Actual supply of `denom`: liquid + bonded + unbonding.
    pub fn total_supply(&self, denom: &str) -> Result<Amount> {
        let mut total: Amount = 0;
        let overflow = || ClawbackError::ArithmeticOverflow(format!("{denom} supply"));
        for coins in self.balances.values() {
            total = total.checked_add(coins.amount_of(denom)).ok_or_else(overflow)?;
        }
        if denom == self.bond_denom {
            for v in self.validators.values() {
                total = total.checked_add(v.tokens).ok_or_else(overflow)?;
            }
            for ubd in self.unbondings.values() {
                total = total.checked_add(ubd.balance()).ok_or_else(overflow)?;
            }
        }
        Ok(total)
    }

    /// Verify supply conservation for `denom`.
    pub fn verify_supply(&self, denom: &str) -> Result<()> {
        self.supply.verify(denom, self.total_supply(denom)?)
    }

    /// Verify supply conservation for every denomination ever minted.
    pub fn verify_all_supply(&self) -> Result<()> {
        for denom in self.supply.tracked_denoms() {
            self.verify_supply(denom)?;
        }
        Ok(())
    }
}

impl AccountKeeper for Ledger {
    fn account(&self, addr: &Address) -> Option<Account> {
        self.accounts.get(addr).cloned()
    }

    fn set_account(&mut self, account: Account) {
        self.accounts.insert(account.address().clone(), account);
    }
}
