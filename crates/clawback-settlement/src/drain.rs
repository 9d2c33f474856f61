//! The three drain stages, applied in fixed order.
//!
//! 1. **liquid**: capped bank transfer of spendable balance
//! 2. **unbonding**: per-validator unbonding entries, collaborator order
//! 3. **delegated**: per-validator delegation shares, collaborator order
//!
//! Stages 2 and 3 share one signed `want` counter in the bond
//! denomination. Token amounts become shares by truncation and shares
//! become tokens again by rounding up, so a stage never asks for more
//! than `want` and never reports less than it moved.

use clawback_types::{Address, Amount, ClawbackError, Coins, Result};
use clawback_vesting::{BankKeeper, StakingKeeper};

pub(crate) fn signed(amount: Amount) -> Result<i128> {
    i128::try_from(amount).map_err(|_| ClawbackError::ArithmeticOverflow(format!("{amount} as i128")))
}

fn unsigned(want: i128) -> Result<Amount> {
    Amount::try_from(want).map_err(|_| ClawbackError::ArithmeticOverflow(format!("{want} as u128")))
}

fn add(total: Amount, more: Amount) -> Result<Amount> {
    total
        .checked_add(more)
        .ok_or_else(|| ClawbackError::ArithmeticOverflow("drain total".into()))
}

/// Transfer `min(target, spendable)` from `from` to `to`. Returns what was
/// moved.
pub fn drain_liquid<H: BankKeeper>(
    host: &mut H,
    from: &Address,
    to: &Address,
    target: &Coins,
) -> Result<Coins> {
    let spendable = host.spendable_balance(from);
    let to_xfer = target.min(&spendable);
    if !to_xfer.is_zero() {
        host.transfer(from, to, &to_xfer)?;
    }
    tracing::debug!(
        account = %from,
        target = %target,
        spendable = %spendable,
        moved = %to_xfer,
        "Liquid pool drained"
    );
    Ok(to_xfer)
}

/// Move unbonding tokens to `to` until `want` is no longer positive.
/// Returns the tokens moved.
pub fn drain_unbonding<H: StakingKeeper>(
    host: &mut H,
    from: &Address,
    to: &Address,
    want: &mut i128,
    limit: u16,
) -> Result<Amount> {
    let mut recovered: Amount = 0;
    for ubd in host.unbonding_delegations(from, limit) {
        if *want <= 0 {
            break;
        }
        let moved = host.transfer_unbonding(from, to, &ubd.validator, unsigned(*want)?)?;
        *want -= signed(moved)?;
        recovered = add(recovered, moved)?;
        tracing::debug!(
            account = %from,
            validator = %ubd.validator,
            moved,
            remaining = *want,
            "Unbonding entry drained"
        );
    }
    Ok(recovered)
}

/// Move delegation shares to `to` until `want` is no longer positive.
/// Validators that have disappeared, or whose share price turns `want`
/// into zero shares, are skipped. Returns the tokens moved.
pub fn drain_delegations<H: StakingKeeper>(
    host: &mut H,
    from: &Address,
    to: &Address,
    want: &mut i128,
    limit: u16,
) -> Result<Amount> {
    let mut recovered: Amount = 0;
    for del in host.delegations(from, limit) {
        if *want <= 0 {
            break;
        }
        let Some(validator) = host.validator(&del.validator) else {
            tracing::warn!(
                account = %from,
                validator = %del.validator,
                "Delegation to unknown validator skipped"
            );
            continue;
        };
        // No validator pays out more than its tokens.
        let ask = unsigned(*want)?.min(validator.tokens);
        let want_shares = host.shares_for_tokens_truncated(&validator, ask)?;
        if want_shares.is_zero() {
            tracing::warn!(
                account = %from,
                validator = %del.validator,
                want = *want,
                "Share price yields zero shares, skipped"
            );
            continue;
        }
        let moved_shares = host.transfer_delegation(from, to, &del.validator, want_shares)?;
        let moved = host.tokens_for_shares_round_up(&validator, moved_shares)?;
        *want -= signed(moved)?;
        recovered = add(recovered, moved)?;
        tracing::debug!(
            account = %from,
            validator = %del.validator,
            shares = %moved_shares,
            moved,
            remaining = *want,
            "Delegation drained"
        );
    }
    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawback_ledger::Ledger;
    use clawback_types::{Shares, ValidatorAddress};
    use rust_decimal::Decimal;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn val(s: &str) -> ValidatorAddress {
        ValidatorAddress::new(s).unwrap()
    }

    fn stake(n: u128) -> Coins {
        Coins::from_coin("stake", n).unwrap()
    }

    fn whole(n: u128) -> Shares {
        Shares::from_tokens(n).unwrap()
    }

    fn ledger_with(amount: u128) -> (Ledger, Address, Address) {
        let mut ledger = Ledger::new("stake").unwrap();
        let (from, to) = (addr("grantee"), addr("funder"));
        ledger.mint(&from, &stake(amount)).unwrap();
        ledger.add_validator(val("val1"));
        ledger.add_validator(val("val2"));
        (ledger, from, to)
    }

    #[test]
    fn liquid_capped_at_spendable() {
        let (mut ledger, from, to) = ledger_with(500);
        let moved = drain_liquid(&mut ledger, &from, &to, &stake(800)).unwrap();
        assert_eq!(moved, stake(500));
        assert_eq!(ledger.all_balances(&to), stake(500));
    }

    #[test]
    fn liquid_nothing_to_move() {
        let (mut ledger, from, to) = ledger_with(0);
        let moved = drain_liquid(&mut ledger, &from, &to, &stake(800)).unwrap();
        assert!(moved.is_zero());
    }

    #[test]
    fn unbonding_stops_once_want_met() {
        let (mut ledger, from, to) = ledger_with(1_000);
        ledger.delegate(&from, &val("val1"), 400).unwrap();
        ledger.delegate(&from, &val("val2"), 400).unwrap();
        ledger.undelegate(&from, &val("val1"), whole(300)).unwrap();
        ledger.undelegate(&from, &val("val2"), whole(300)).unwrap();

        let mut want = 350;
        let moved = drain_unbonding(&mut ledger, &from, &to, &mut want, u16::MAX).unwrap();
        assert_eq!(moved, 350);
        assert_eq!(want, 0);
        // val1 drained first, in collaborator order.
        assert!(ledger.unbonding_delegation(&from, &val("val1")).is_none());
        assert_eq!(ledger.unbonding_amount(&from).unwrap(), 250);
    }

    #[test]
    fn delegations_skip_missing_validator() {
        let (mut ledger, from, to) = ledger_with(1_000);
        ledger.delegate(&from, &val("val1"), 400).unwrap();
        ledger.delegate(&from, &val("val2"), 400).unwrap();
        ledger.remove_validator(&val("val1"));

        let mut want = 300;
        let moved = drain_delegations(&mut ledger, &from, &to, &mut want, u16::MAX).unwrap();
        assert_eq!(moved, 300);
        assert_eq!(want, 0);
        assert_eq!(ledger.delegation(&to, &val("val2")).unwrap().shares, whole(300));
    }

    #[test]
    fn delegations_skip_zero_share_validator() {
        let (mut ledger, from, to) = ledger_with(1_000);
        ledger.delegate(&from, &val("val1"), 100).unwrap();
        ledger.delegate(&from, &val("val2"), 400).unwrap();
        ledger.slash(&val("val1"), Decimal::ONE).unwrap();

        let mut want = 200;
        let moved = drain_delegations(&mut ledger, &from, &to, &mut want, u16::MAX).unwrap();
        assert_eq!(moved, 200);
        assert_eq!(want, 0);
        assert_eq!(ledger.delegation(&from, &val("val1")).unwrap().shares, whole(100));
    }

    #[test]
    fn delegations_leave_shortfall_in_want() {
        let (mut ledger, from, to) = ledger_with(1_000);
        ledger.delegate(&from, &val("val1"), 100).unwrap();
        let mut want = 150;
        let moved = drain_delegations(&mut ledger, &from, &to, &mut want, u16::MAX).unwrap();
        assert_eq!(moved, 100);
        assert_eq!(want, 50);
    }

    #[test]
    fn nearly_wiped_validator_pays_what_it_has() {
        let mut ledger = Ledger::new("stake").unwrap();
        let (from, to, whale) = (addr("grantee"), addr("funder"), addr("whale"));
        let v1 = val("val1");
        ledger.add_validator(v1.clone());
        ledger.mint(&whale, &stake(100_000_000_000_000_000_000 - 10_000_000_000)).unwrap();
        ledger.mint(&from, &stake(10_000_000_000)).unwrap();
        ledger.delegate(&whale, &v1, 100_000_000_000_000_000_000 - 10_000_000_000).unwrap();
        ledger.delegate(&from, &v1, 10_000_000_000).unwrap();
        let fraction: Decimal = "0.99999999999999999999".parse().unwrap();
        ledger.slash(&v1, fraction).unwrap();
        assert_eq!(ledger.validator(&v1).unwrap().tokens, 1);

        let mut want = 5;
        let moved = drain_delegations(&mut ledger, &from, &to, &mut want, u16::MAX).unwrap();
        assert_eq!(moved, 1);
        assert_eq!(want, 4);
        assert!(ledger.delegation(&from, &v1).is_none());
    }
}
