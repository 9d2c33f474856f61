//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced after every transaction:
//! ```text
//! ∀ denom: Σ(liquid) + Σ(bonded) + Σ(unbonding) == Σ(minted) - Σ(burned)
//! ```
//!
//! Transfers, delegations and clawbacks only move tokens between pools, so
//! they must leave the sum unchanged. Only minting and slashing change it.

use std::collections::BTreeMap;

use clawback_types::{Amount, ClawbackError, Denom, Result};

/// Tracks per-denomination minted and burned totals.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    minted: BTreeMap<Denom, Amount>,
    burned: BTreeMap<Denom, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, denom: &str, amount: Amount) {
        let slot = self.minted.entry(denom.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Record tokens destroyed by slashing.
    pub fn record_burn(&mut self, denom: &str, amount: Amount) {
        let slot = self.burned.entry(denom.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Expected total supply: minted - burned.
    #[must_use]
    pub fn expected_supply(&self, denom: &str) -> Amount {
        self.total_minted(denom)
            .saturating_sub(self.total_burned(denom))
    }

    /// Verify that the actual supply matches the expected supply.
    ///
    /// # Errors
    /// Returns [`ClawbackError::InvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, denom: &str, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(denom);
        if actual_supply != expected {
            return Err(ClawbackError::InvariantViolation {
                reason: format!(
                    "Denom {denom}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(denom),
                    self.total_burned(denom),
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_minted(&self, denom: &str) -> Amount {
        self.minted.get(denom).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_burned(&self, denom: &str) -> Amount {
        self.burned.get(denom).copied().unwrap_or(0)
    }

    /// All denominations ever minted.
    pub fn tracked_denoms(&self) -> impl Iterator<Item = &str> {
        self.minted.keys().map(String::as_str)
    }
}
