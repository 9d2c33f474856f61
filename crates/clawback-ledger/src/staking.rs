//! Validators, delegations, unbondings and share accounting.
//!
//! A validator's `delegator_shares` are backed by its `tokens`. Slashing
//! burns tokens without touching shares, so each share is worth less
//! afterwards:
//!
//! ```text
//! tokens(shares) = shares * validator.tokens / validator.delegator_shares
//! shares(tokens) = tokens * validator.delegator_shares / validator.tokens
//! ```
//!
//! Both directions are computed exactly in 256 bits. Tokens to shares
//! floors, shares to tokens floors or ceils as the caller asks.

use clawback_types::{
    Address, Amount, ClawbackError, Coins, Denom, Result, Shares, ValidatorAddress,
    mul_div_ceil, mul_div_floor,
};
use clawback_vesting::{
    Account, BankKeeper, Delegation, StakingKeeper, UnbondingDelegation, UnbondingEntry,
    Validator,
};
use rust_decimal::Decimal;

use crate::Ledger;

fn no_shares(validator: &Validator) -> ClawbackError {
    ClawbackError::ShareConversion {
        reason: format!("{} has no delegator shares", validator.address),
    }
}

fn tokens_for_shares_truncated(validator: &Validator, shares: Shares) -> Result<Amount> {
    if validator.delegator_shares.is_zero() {
        return Err(no_shares(validator));
    }
    mul_div_floor(shares.raw(), validator.tokens, validator.delegator_shares.raw())
}

/// `⌊amount · fraction⌋` for a fraction in `[0, 1]`, exact.
fn slash_cut(amount: Amount, fraction: Decimal) -> Result<Amount> {
    let numerator = u128::try_from(fraction.mantissa()).map_err(|_| {
        ClawbackError::ShareConversion {
            reason: format!("negative slash fraction {fraction}"),
        }
    })?;
    let denominator = 10u128
        .checked_pow(fraction.scale())
        .ok_or_else(|| ClawbackError::ArithmeticOverflow("slash fraction scale".into()))?;
    mul_div_floor(amount, numerator, denominator)
}

impl Ledger {
    /// Register an empty validator.
    pub fn add_validator(&mut self, addr: ValidatorAddress) {
        self.validators.entry(addr.clone()).or_insert(Validator {
            address: addr,
            tokens: 0,
            delegator_shares: Shares::ZERO,
        });
    }

    /// Drop a validator record. Delegations to it are left in place and
    /// become unreachable through [`StakingKeeper::validator`].
    pub fn remove_validator(&mut self, addr: &ValidatorAddress) -> Option<Validator> {
        self.validators.remove(addr)
    }

    #[must_use]
    pub fn delegation(&self, delegator: &Address, validator: &ValidatorAddress) -> Option<Delegation> {
        self.delegations
            .get(&(delegator.clone(), validator.clone()))
            .cloned()
    }

    #[must_use]
    pub fn unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &ValidatorAddress,
    ) -> Option<UnbondingDelegation> {
        self.unbondings
            .get(&(delegator.clone(), validator.clone()))
            .cloned()
    }

    /// Shares minted for a new delegation of `amount`.
    fn issue_shares(validator: &Validator, amount: Amount) -> Result<Shares> {
        if validator.delegator_shares.is_zero() {
            return Shares::from_tokens(amount);
        }
        if validator.tokens == 0 {
            return Err(ClawbackError::ShareConversion {
                reason: format!("{} has no tokens behind its shares", validator.address),
            });
        }
        mul_div_floor(amount, validator.delegator_shares.raw(), validator.tokens)
            .map(Shares::from_raw)
    }

    /// Bond `amount` of the bond denomination from `delegator` to
    /// `validator`. Vesting accounts record the delegation against their
    /// grant first.
    pub fn delegate(
        &mut self,
        delegator: &Address,
        validator: &ValidatorAddress,
        amount: Amount,
    ) -> Result<Shares> {
        let val = self
            .validators
            .get(validator)
            .cloned()
            .ok_or_else(|| ClawbackError::ValidatorNotFound(validator.clone()))?;
        let coins = Coins::from_coin(&self.bond_denom, amount)?;
        if coins.is_zero() {
            return Err(ClawbackError::InvalidCoins {
                reason: "delegation amount is zero".into(),
            });
        }
        let balance = self.all_balances(delegator);
        if !balance.is_all_gte(&coins) {
            return Err(ClawbackError::InsufficientFunds {
                address: delegator.clone(),
                needed: coins,
                available: balance,
            });
        }
        let shares = Self::issue_shares(&val, amount)?;
        let tokens = val
            .tokens
            .checked_add(amount)
            .ok_or_else(|| ClawbackError::ArithmeticOverflow("validator tokens".into()))?;
        let total_shares = val.delegator_shares.checked_add(shares)?;

        let now = self.now();
        if let Some(Account::ClawbackVesting(va)) = self.accounts.get_mut(delegator) {
            va.track_delegation(&balance, &coins, now)?;
        }
        self.debit(delegator, &coins)?;
        if let Some(v) = self.validators.get_mut(validator) {
            v.tokens = tokens;
            v.delegator_shares = total_shares;
        }
        self.add_shares(delegator, validator, shares)?;

        tracing::debug!(
            delegator = %delegator,
            validator = %validator,
            amount,
            shares = %shares,
            "Delegated"
        );
        Ok(shares)
    }

    fn add_shares(
        &mut self,
        delegator: &Address,
        validator: &ValidatorAddress,
        shares: Shares,
    ) -> Result<()> {
        let del = self
            .delegations
            .entry((delegator.clone(), validator.clone()))
            .or_insert_with(|| Delegation {
                delegator: delegator.clone(),
                validator: validator.clone(),
                shares: Shares::ZERO,
            });
        del.shares = del.shares.checked_add(shares)?;
        Ok(())
    }

    /// Start unbonding `shares`. The tokens stay counted as staked until
    /// [`Ledger::complete_unbondings`] returns them.
    pub fn undelegate(
        &mut self,
        delegator: &Address,
        validator: &ValidatorAddress,
        shares: Shares,
    ) -> Result<Amount> {
        let key = (delegator.clone(), validator.clone());
        let held = self
            .delegations
            .get(&key)
            .map(|d| d.shares)
            .ok_or_else(|| ClawbackError::DelegationNotFound {
                delegator: delegator.clone(),
                validator: validator.clone(),
            })?;
        if shares > held || shares.is_zero() {
            return Err(ClawbackError::InsufficientShares {
                requested: shares,
                available: held,
            });
        }
        let val = self
            .validators
            .get(validator)
            .cloned()
            .ok_or_else(|| ClawbackError::ValidatorNotFound(validator.clone()))?;
        let tokens = tokens_for_shares_truncated(&val, shares)?;
        let left_tokens = val
            .tokens
            .checked_sub(tokens)
            .ok_or_else(|| ClawbackError::ArithmeticOverflow("validator tokens".into()))?;
        let left_shares = val.delegator_shares.checked_sub(shares)?;

        if held == shares {
            self.delegations.remove(&key);
        } else if let Some(d) = self.delegations.get_mut(&key) {
            d.shares = held.checked_sub(shares)?;
        }
        if let Some(v) = self.validators.get_mut(validator) {
            v.tokens = left_tokens;
            v.delegator_shares = left_shares;
        }
        let entry = UnbondingEntry {
            creation_height: self.block.height,
            completion_time: self.now().saturating_add(self.unbonding_period_secs),
            initial_balance: tokens,
            balance: tokens,
        };
        self.unbondings
            .entry(key)
            .or_insert_with(|| UnbondingDelegation {
                delegator: delegator.clone(),
                validator: validator.clone(),
                entries: Vec::new(),
            })
            .entries
            .push(entry);
        Ok(tokens)
    }

    /// Pay out every matured unbonding entry of `delegator`.
    pub fn complete_unbondings(&mut self, delegator: &Address) -> Result<Amount> {
        let now = self.now();
        let mut matured: Amount = 0;
        let keys: Vec<_> = self
            .unbondings
            .keys()
            .filter(|(d, _)| d == delegator)
            .cloned()
            .collect();
        for key in keys {
            let Some(ubd) = self.unbondings.get_mut(&key) else {
                continue;
            };
            for entry in ubd.entries.iter().filter(|e| e.completion_time <= now) {
                matured = matured
                    .checked_add(entry.balance)
                    .ok_or_else(|| ClawbackError::ArithmeticOverflow("unbonding payout".into()))?;
            }
            ubd.entries.retain(|e| e.completion_time > now);
            if ubd.entries.is_empty() {
                self.unbondings.remove(&key);
            }
        }
        let coins = Coins::from_coin(&self.bond_denom, matured)?;
        if let Some(Account::ClawbackVesting(va)) = self.accounts.get_mut(delegator) {
            va.track_undelegation(&coins)?;
        }
        self.credit(delegator, &coins)?;
        Ok(matured)
    }

    /// Burn `fraction` of the validator's bonded tokens and of every
    /// unbonding entry with it. Returns the amount burned.
    pub fn slash(&mut self, validator: &ValidatorAddress, fraction: Decimal) -> Result<Amount> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(ClawbackError::ShareConversion {
                reason: format!("slash fraction {fraction} outside [0, 1]"),
            });
        }
        let val = self
            .validators
            .get_mut(validator)
            .ok_or_else(|| ClawbackError::ValidatorNotFound(validator.clone()))?;
        let mut burned = slash_cut(val.tokens, fraction)?;
        val.tokens -= burned;

        for ubd in self
            .unbondings
            .values_mut()
            .filter(|u| &u.validator == validator)
        {
            for entry in &mut ubd.entries {
                let b = slash_cut(entry.balance, fraction)?;
                entry.balance -= b;
                burned += b;
            }
        }
        self.supply.record_burn(&self.bond_denom, burned);
        tracing::warn!(validator = %validator, fraction = %fraction, burned, "Validator slashed");
        Ok(burned)
    }
}

impl StakingKeeper for Ledger {
    fn bond_denom(&self) -> Denom {
        self.bond_denom.clone()
    }

    fn bonded_amount(&self, delegator: &Address) -> Result<Amount> {
        let mut total: Amount = 0;
        for del in self.delegations.values().filter(|d| &d.delegator == delegator) {
            let Some(val) = self.validators.get(&del.validator) else {
                continue;
            };
            total = total
                .checked_add(tokens_for_shares_truncated(val, del.shares)?)
                .ok_or_else(|| ClawbackError::ArithmeticOverflow("bonded total".into()))?;
        }
        Ok(total)
    }

    fn unbonding_amount(&self, delegator: &Address) -> Result<Amount> {
        self.unbondings
            .values()
            .filter(|u| &u.delegator == delegator)
            .try_fold(0, |acc: Amount, u| {
                acc.checked_add(u.balance())
                    .ok_or_else(|| ClawbackError::ArithmeticOverflow("unbonding total".into()))
            })
    }

    fn unbonding_delegations(&self, delegator: &Address, limit: u16) -> Vec<UnbondingDelegation> {
        self.unbondings
            .values()
            .filter(|u| &u.delegator == delegator)
            .take(usize::from(limit))
            .cloned()
            .collect()
    }

    fn delegations(&self, delegator: &Address, limit: u16) -> Vec<Delegation> {
        self.delegations
            .values()
            .filter(|d| &d.delegator == delegator)
            .take(usize::from(limit))
            .cloned()
            .collect()
    }

    fn validator(&self, addr: &ValidatorAddress) -> Option<Validator> {
        self.validators.get(addr).cloned()
    }

    fn shares_for_tokens_truncated(&self, validator: &Validator, tokens: Amount) -> Result<Shares> {
        if validator.tokens == 0 {
            return Ok(Shares::ZERO);
        }
        mul_div_floor(tokens, validator.delegator_shares.raw(), validator.tokens)
            .map(Shares::from_raw)
    }

    fn tokens_for_shares_round_up(&self, validator: &Validator, shares: Shares) -> Result<Amount> {
        if validator.delegator_shares.is_zero() {
            return Err(no_shares(validator));
        }
        mul_div_ceil(shares.raw(), validator.tokens, validator.delegator_shares.raw())
    }

    fn transfer_unbonding(
        &mut self,
        from: &Address,
        to: &Address,
        validator: &ValidatorAddress,
        want: Amount,
    ) -> Result<Amount> {
        let key = (from.clone(), validator.clone());
        let Some(src) = self.unbondings.get_mut(&key) else {
            return Ok(0);
        };
        let mut moved: Amount = 0;
        let mut moved_entries = Vec::new();
        for entry in &mut src.entries {
            if moved >= want {
                break;
            }
            let take = entry.balance.min(want - moved);
            if take == 0 {
                continue;
            }
            entry.balance -= take;
            moved += take;
            moved_entries.push(UnbondingEntry {
                creation_height: entry.creation_height,
                completion_time: entry.completion_time,
                initial_balance: take,
                balance: take,
            });
        }
        src.entries.retain(|e| e.balance > 0);
        if src.entries.is_empty() {
            self.unbondings.remove(&key);
        }
        if !moved_entries.is_empty() {
            self.ensure_account(to);
            self.unbondings
                .entry((to.clone(), validator.clone()))
                .or_insert_with(|| UnbondingDelegation {
                    delegator: to.clone(),
                    validator: validator.clone(),
                    entries: Vec::new(),
                })
                .entries
                .extend(moved_entries);
        }
        Ok(moved)
    }

    fn transfer_delegation(
        &mut self,
        from: &Address,
        to: &Address,
        validator: &ValidatorAddress,
        want_shares: Shares,
    ) -> Result<Shares> {
        let key = (from.clone(), validator.clone());
        let held = self
            .delegations
            .get(&key)
            .map(|d| d.shares)
            .ok_or_else(|| ClawbackError::DelegationNotFound {
                delegator: from.clone(),
                validator: validator.clone(),
            })?;
        if want_shares.is_zero() {
            return Ok(Shares::ZERO);
        }
        let moved = want_shares.min(held);
        if moved == held {
            self.delegations.remove(&key);
        } else if let Some(d) = self.delegations.get_mut(&key) {
            d.shares = held.checked_sub(moved)?;
        }
        self.ensure_account(to);
        self.add_shares(to, validator, moved)?;
        Ok(moved)
    }
}
