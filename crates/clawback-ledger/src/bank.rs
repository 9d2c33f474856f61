//! Liquid balances and transfers.
//!
//! Spendable balance is vesting-aware: a clawback vesting account can only
//! move `balance - locked_coins(now)`.

use clawback_types::{Address, ClawbackError, Coins, Result};
use clawback_vesting::BankKeeper;

use crate::Ledger;

impl Ledger {
    /// Create new tokens in `addr`'s balance.
    pub fn mint(&mut self, addr: &Address, amount: &Coins) -> Result<()> {
        self.credit(addr, amount)?;
        for (denom, value) in amount.iter() {
            self.supply.record_mint(denom, value);
        }
        Ok(())
    }

    pub fn set_send_enabled(&mut self, denom: &str, enabled: bool) {
        if enabled {
            self.send_disabled.remove(denom);
        } else {
            self.send_disabled.insert(denom.to_string());
        }
    }

    /// Add to a balance, creating a base account for unknown addresses.
    pub(crate) fn credit(&mut self, addr: &Address, amount: &Coins) -> Result<()> {
        self.ensure_account(addr);
        let balance = self.balances.entry(addr.clone()).or_default();
        *balance = balance.checked_add(amount)?;
        Ok(())
    }

    /// Remove from a balance, ignoring vesting locks.
    pub(crate) fn debit(&mut self, addr: &Address, amount: &Coins) -> Result<()> {
        let current = self.all_balances(addr);
        let left = current
            .checked_sub(amount)
            .map_err(|_| ClawbackError::InsufficientFunds {
                address: addr.clone(),
                needed: amount.clone(),
                available: current.clone(),
            })?;
        if left.is_zero() {
            self.balances.remove(addr);
        } else {
            self.balances.insert(addr.clone(), left);
        }
        Ok(())
    }
}

impl BankKeeper for Ledger {
    fn spendable_balance(&self, addr: &Address) -> Coins {
        let balance = self.all_balances(addr);
        match self.accounts.get(addr) {
            Some(account) => balance.saturating_sub(&account.locked_coins(self.now())),
            None => balance,
        }
    }

    fn all_balances(&self, addr: &Address) -> Coins {
        self.balances.get(addr).cloned().unwrap_or_default()
    }

    fn send_enabled(&self, denom: &str) -> bool {
        !self.send_disabled.contains(denom)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: &Coins) -> Result<()> {
        if let Some(denom) = amount.denoms().find(|d| !self.send_enabled(d)) {
            return Err(ClawbackError::SendDisabled(denom.to_string()));
        }
        let spendable = self.spendable_balance(from);
        if !spendable.is_all_gte(amount) {
            return Err(ClawbackError::InsufficientFunds {
                address: from.clone(),
                needed: amount.clone(),
                available: spendable,
            });
        }
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        tracing::debug!(from = %from, to = %to, amount = %amount, "Transfer");
        Ok(())
    }
}
