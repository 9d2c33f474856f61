//! Slashing reconciliation of the delegation split.
//!
//! ```text
//! old_delegated = delegated_vesting + delegated_free
//! slashed       = old_delegated - min(delegated, old_delegated)
//! total         = delegated + unbonded
//! to_claw_back  = min(total_vesting, total)
//! new_delegated = min(delegated, total -sat total_vesting) + slashed
//! delegated_vesting' = min(total_vesting, new_delegated)
//! delegated_free'    = new_delegated - delegated_vesting'
//! ```
//!
//! Liquid tokens are drained first, so whatever stays delegated after the
//! clawback is attributed to vesting up to the recovered target. Slashed
//! tokens no longer exist anywhere and stay on the books instead of being
//! charged a second time.

use clawback_types::{Coins, Result};

/// Outcome of reconciling a grant against current staking totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Previously tracked delegation that no longer exists.
    pub slashed: Coins,
    /// Everything the account currently holds: staked plus liquid.
    pub total: Coins,
    /// Drain target, capped at what exists.
    pub to_claw_back: Coins,
    pub delegated_vesting: Coins,
    pub delegated_free: Coins,
}

/// Reconcile the grant's recorded split (`old_vesting`, `old_free`) with
/// the staking collaborator's `delegated` (bonded + unbonding) and the
/// account's `unbonded` balance, for a clawback of `total_vesting`.
pub fn reconcile(
    total_vesting: &Coins,
    delegated: &Coins,
    unbonded: &Coins,
    old_vesting: &Coins,
    old_free: &Coins,
) -> Result<Reconciliation> {
    let old_delegated = old_vesting.checked_add(old_free)?;
    let slashed = old_delegated.checked_sub(&delegated.min(&old_delegated))?;
    let total = delegated.checked_add(unbonded)?;
    let to_claw_back = total_vesting.min(&total);
    let new_delegated = delegated
        .min(&total.saturating_sub(total_vesting))
        .checked_add(&slashed)?;
    let delegated_vesting = total_vesting.min(&new_delegated);
    let delegated_free = new_delegated.checked_sub(&delegated_vesting)?;
    Ok(Reconciliation {
        slashed,
        total,
        to_claw_back,
        delegated_vesting,
        delegated_free,
    })
}
