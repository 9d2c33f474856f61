//! The clawback engine: grant creation and settlement.
//!
//! The engine is stateless between calls. All chain state is reached
//! through the [`Host`] capabilities and every time-dependent value reads
//! the same [`BlockContext`].

use clawback_types::{
    Address, BlockContext, ClawbackConfig, ClawbackError, ClawbackResult, Coins,
    MsgClawback, MsgCreateClawbackVestingAccount, Result,
};
use clawback_vesting::{Account, ClawbackVestingAccount, Host};

use crate::drain::{self, signed};
use crate::receipt::ClawbackReceipt;
use crate::reconcile::reconcile;

/// Creates vesting grants and claws back their unvested remainder.
#[derive(Debug, Clone, Default)]
pub struct ClawbackEngine {
    config: ClawbackConfig,
}

impl ClawbackEngine {
    /// Create an engine with a validated configuration.
    pub fn new(config: ClawbackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ClawbackConfig {
        &self.config
    }

    /// Fund a new clawback vesting account from `msg.funder`.
    ///
    /// # Errors
    /// - `InvalidCoins` / `InvalidSchedule` for a malformed message
    /// - `BlockedAddress` if the recipient may not hold a grant
    /// - `AccountExists` if anything is stored at the recipient already
    /// - `SendDisabled` / `InsufficientFunds` from the bank
    pub fn create_vesting_account<H: Host>(
        &self,
        host: &mut H,
        ctx: &BlockContext,
        msg: &MsgCreateClawbackVestingAccount,
    ) -> Result<ClawbackVestingAccount> {
        msg.validate_basic()?;
        if self.config.is_blocked(&msg.to_address) {
            return Err(ClawbackError::BlockedAddress(msg.to_address.clone()));
        }
        if host.account(&msg.to_address).is_some() {
            return Err(ClawbackError::AccountExists(msg.to_address.clone()));
        }

        let start = msg.start_time.unwrap_or_else(|| ctx.unix());
        if msg.end_time <= start {
            return Err(ClawbackError::InvalidSchedule {
                reason: format!("end {} must be after start {start}", msg.end_time),
            });
        }
        let duration = msg.end_time - start;
        if duration > self.config.max_vesting_duration_secs {
            return Err(ClawbackError::InvalidSchedule {
                reason: format!(
                    "duration {duration}s exceeds maximum {}s",
                    self.config.max_vesting_duration_secs
                ),
            });
        }
        if let Some(denom) = msg.amount.denoms().find(|d| !host.send_enabled(d)) {
            return Err(ClawbackError::SendDisabled(denom.to_string()));
        }

        let grant = ClawbackVestingAccount::new(
            msg.to_address.clone(),
            Some(msg.funder.clone()),
            msg.amount.clone(),
            start,
            msg.end_time,
        )?;
        host.transfer(&msg.funder, &msg.to_address, &msg.amount)?;
        host.set_account(Account::ClawbackVesting(grant.clone()));

        tracing::info!(
            height = ctx.height,
            funder = %msg.funder,
            account = %msg.to_address,
            amount = %msg.amount,
            start,
            end = msg.end_time,
            "Vesting grant created"
        );
        Ok(grant)
    }

    /// Claw back everything still vesting in `msg.account` for its funder.
    ///
    /// Drains the liquid balance first, then unbonding entries, then
    /// delegations. The account's schedule is force-completed at block
    /// time, so a second clawback fails with `NothingToClawBack`.
    ///
    /// On error the host may hold partial writes; callers must discard
    /// them (see `clawback_ledger::Ledger::execute`).
    pub fn clawback<H: Host>(
        &self,
        host: &mut H,
        ctx: &BlockContext,
        msg: &MsgClawback,
    ) -> Result<ClawbackReceipt> {
        msg.validate_basic()?;
        let now = ctx.unix();
        let account = &msg.account;
        let mut grant = Self::load_grant(host, msg, now)?;

        let total_vesting = grant.vesting_coins(now);
        grant.force_complete(now);
        host.set_account(Account::ClawbackVesting(grant.clone()));

        let bond_denom = host.bond_denom();
        let bonded = Coins::from_coin(&bond_denom, host.bonded_amount(account)?)?;
        let unbonding = Coins::from_coin(&bond_denom, host.unbonding_amount(account)?)?;
        let delegated = bonded.checked_add(&unbonding)?;
        let unbonded = host.all_balances(account);

        let rec = reconcile(
            &total_vesting,
            &delegated,
            &unbonded,
            &grant.delegated_vesting,
            &grant.delegated_free,
        )?;
        if !rec.slashed.is_zero() {
            tracing::warn!(
                account = %account,
                slashed = %rec.slashed,
                total_vesting = %total_vesting,
                recoverable = %rec.to_claw_back,
                "Slashing shortfall, clawback capped at remaining funds"
            );
        }
        grant.delegated_vesting = rec.delegated_vesting;
        grant.delegated_free = rec.delegated_free;
        host.set_account(Account::ClawbackVesting(grant));

        let liquid = drain::drain_liquid(host, account, &msg.funder, &rec.to_claw_back)?;
        let remaining = rec.to_claw_back.checked_sub(&liquid)?;

        let mut result = ClawbackResult {
            liquid,
            ..ClawbackResult::default()
        };
        if !remaining.is_zero() {
            let limit = self.config.entry_limit;
            let mut want = signed(remaining.amount_of(&bond_denom))?;
            let residual = remaining.without(&bond_denom);

            let from_unbonding =
                drain::drain_unbonding(host, account, &msg.funder, &mut want, limit)?;
            let from_delegations =
                drain::drain_delegations(host, account, &msg.funder, &mut want, limit)?;

            if want != 0 || !residual.is_zero() {
                tracing::error!(
                    height = ctx.height,
                    account = %account,
                    want,
                    residual = %residual,
                    to_claw_back = %rec.to_claw_back,
                    "Clawback drain did not meet its target"
                );
                return Err(ClawbackError::InvariantViolation {
                    reason: format!(
                        "clawback of {account} left want={want} {bond_denom}, residual {residual}"
                    ),
                });
            }
            result.unbonding = Coins::from_coin(&bond_denom, from_unbonding)?;
            result.delegated = Coins::from_coin(&bond_denom, from_delegations)?;
        }

        let receipt =
            ClawbackReceipt::new(msg.funder.clone(), account.clone(), ctx, total_vesting, result);
        tracing::info!(
            height = ctx.height,
            funder = %msg.funder,
            account = %account,
            liquid = %receipt.result.liquid,
            unbonding = %receipt.result.unbonding,
            delegated = %receipt.result.delegated,
            digest = %receipt.digest_hex(),
            "Clawback settled"
        );
        Ok(receipt)
    }

    /// Precondition checks, in order. No state is touched.
    fn load_grant<H: Host>(
        host: &H,
        msg: &MsgClawback,
        now: i64,
    ) -> Result<ClawbackVestingAccount> {
        let account = host
            .account(&msg.account)
            .ok_or_else(|| ClawbackError::AccountNotFound(msg.account.clone()))?;
        let Account::ClawbackVesting(grant) = account else {
            return Err(ClawbackError::NotVestingAccount(msg.account.clone()));
        };
        if !grant.is_funded_by(&msg.funder) {
            return Err(ClawbackError::NotFunder {
                requester: msg.funder.clone(),
                account: msg.account.clone(),
            });
        }
        if grant.is_settled(now) {
            return Err(ClawbackError::NothingToClawBack(msg.account.clone()));
        }
        Ok(grant)
    }

    /// Unvested amount a clawback at `now` would target, if `addr` holds a
    /// grant.
    pub fn unvested<H: Host>(host: &H, addr: &Address, now: i64) -> Option<Coins> {
        host.account(addr)
            .and_then(|a| a.as_vesting().map(|g| g.vesting_coins(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawback_ledger::Ledger;
    use clawback_types::{Amount, Denom, Shares, ValidatorAddress};
    use clawback_vesting::{
        AccountKeeper, BankKeeper, Delegation, StakingKeeper, UnbondingDelegation, Validator,
    };

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn stake(n: u128) -> Coins {
        Coins::from_coin("stake", n).unwrap()
    }

    fn setup(amount: u128) -> (Ledger, ClawbackEngine) {
        let mut ledger = Ledger::new("stake").unwrap();
        ledger.mint(&addr("funder"), &stake(amount)).unwrap();
        let engine = ClawbackEngine::default();
        let msg = MsgCreateClawbackVestingAccount {
            funder: addr("funder"),
            to_address: addr("grantee"),
            amount: stake(amount),
            start_time: Some(0),
            end_time: 100,
        };
        let ctx = ledger.block();
        engine.create_vesting_account(&mut ledger, &ctx, &msg).unwrap();
        (ledger, engine)
    }

    fn claw(funder: &str, account: &str) -> MsgClawback {
        MsgClawback {
            funder: addr(funder),
            account: addr(account),
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = ClawbackConfig {
            entry_limit: 0,
            ..ClawbackConfig::default()
        };
        assert!(ClawbackEngine::new(cfg).is_err());
    }

    #[test]
    fn clawback_all_liquid() {
        let (mut ledger, engine) = setup(10_000);
        let ctx = ledger.advance_to(30).unwrap();
        let receipt = engine
            .clawback(&mut ledger, &ctx, &claw("funder", "grantee"))
            .unwrap();
        assert_eq!(receipt.result.liquid, stake(7_000));
        assert!(receipt.result.unbonding.is_zero());
        assert!(receipt.result.delegated.is_zero());
        assert_eq!(receipt.total_vesting, stake(7_000));
        assert_eq!(ledger.all_balances(&addr("funder")), stake(7_000));
        assert_eq!(ledger.all_balances(&addr("grantee")), stake(3_000));
        assert!(receipt.verify_digest());
    }

    #[test]
    fn clawback_settles_grant() {
        let (mut ledger, engine) = setup(10_000);
        let ctx = ledger.advance_to(30).unwrap();
        engine
            .clawback(&mut ledger, &ctx, &claw("funder", "grantee"))
            .unwrap();
        let grant = ledger.account(&addr("grantee")).unwrap();
        let grant = grant.as_vesting().unwrap();
        assert_eq!(grant.original_vesting, stake(3_000));
        assert_eq!(grant.end_time, 30);
        assert!(grant.is_settled(30));
        assert_eq!(ClawbackEngine::unvested(&ledger, &addr("grantee"), 30), Some(Coins::new()));
    }

    #[test]
    fn preconditions_in_order() {
        let (mut ledger, engine) = setup(10_000);
        ledger.mint(&addr("plain"), &stake(1)).unwrap();
        let ctx = ledger.advance_to(30).unwrap();

        let err = engine.clawback(&mut ledger, &ctx, &claw("funder", "ghost")).unwrap_err();
        assert!(matches!(err, ClawbackError::AccountNotFound(_)));
        let err = engine.clawback(&mut ledger, &ctx, &claw("funder", "plain")).unwrap_err();
        assert!(matches!(err, ClawbackError::NotVestingAccount(_)));
        let err = engine.clawback(&mut ledger, &ctx, &claw("mallory", "grantee")).unwrap_err();
        assert!(matches!(err, ClawbackError::NotFunder { .. }));
        let err = engine.clawback(&mut ledger, &ctx, &claw("grantee", "grantee")).unwrap_err();
        assert!(matches!(err, ClawbackError::InvalidAddress { .. }));

        // Nothing was touched.
        assert_eq!(ledger.all_balances(&addr("grantee")), stake(10_000));
        assert_eq!(
            ledger.account(&addr("grantee")).unwrap().as_vesting().unwrap().end_time,
            100
        );
    }

    #[test]
    fn nothing_to_claw_back_after_end() {
        let (mut ledger, engine) = setup(10_000);
        let ctx = ledger.advance_to(100).unwrap();
        let err = engine.clawback(&mut ledger, &ctx, &claw("funder", "grantee")).unwrap_err();
        assert!(matches!(err, ClawbackError::NothingToClawBack(_)));
    }

    #[test]
    fn create_rejects_blocked_and_existing() {
        let mut ledger = Ledger::new("stake").unwrap();
        ledger.mint(&addr("funder"), &stake(100)).unwrap();
        let engine = ClawbackEngine::new(ClawbackConfig {
            blocked_addresses: vec![addr("distribution")],
            ..ClawbackConfig::default()
        })
        .unwrap();
        let ctx = ledger.block();
        let mut msg = MsgCreateClawbackVestingAccount {
            funder: addr("funder"),
            to_address: addr("distribution"),
            amount: stake(10),
            start_time: None,
            end_time: 100,
        };
        let err = engine.create_vesting_account(&mut ledger, &ctx, &msg).unwrap_err();
        assert!(matches!(err, ClawbackError::BlockedAddress(_)));

        msg.to_address = addr("funder");
        let err = engine.create_vesting_account(&mut ledger, &ctx, &msg).unwrap_err();
        assert!(matches!(err, ClawbackError::AccountExists(_)));
    }

    #[test]
    fn create_defaults_start_to_block_time() {
        let mut ledger = Ledger::new("stake").unwrap();
        ledger.mint(&addr("funder"), &stake(100)).unwrap();
        let ctx = ledger.advance_to(40).unwrap();
        let msg = MsgCreateClawbackVestingAccount {
            funder: addr("funder"),
            to_address: addr("grantee"),
            amount: stake(100),
            start_time: None,
            end_time: 140,
        };
        let grant = ClawbackEngine::default()
            .create_vesting_account(&mut ledger, &ctx, &msg)
            .unwrap();
        assert_eq!(grant.start_time, 40);
        assert_eq!(grant.funder, Some(addr("funder")));
        assert_eq!(ledger.all_balances(&addr("grantee")), stake(100));
        assert!(ledger.spendable_balance(&addr("grantee")).is_zero());
    }

    #[test]
    fn create_rejects_end_before_block_time() {
        let mut ledger = Ledger::new("stake").unwrap();
        ledger.mint(&addr("funder"), &stake(100)).unwrap();
        let ctx = ledger.advance_to(200).unwrap();
        let msg = MsgCreateClawbackVestingAccount {
            funder: addr("funder"),
            to_address: addr("grantee"),
            amount: stake(100),
            start_time: None,
            end_time: 150,
        };
        let err = ClawbackEngine::default()
            .create_vesting_account(&mut ledger, &ctx, &msg)
            .unwrap_err();
        assert!(matches!(err, ClawbackError::InvalidSchedule { .. }));
    }

    #[test]
    fn create_rejects_overlong_schedule() {
        let mut ledger = Ledger::new("stake").unwrap();
        ledger.mint(&addr("funder"), &stake(100)).unwrap();
        let engine = ClawbackEngine::new(ClawbackConfig {
            max_vesting_duration_secs: 50,
            ..ClawbackConfig::default()
        })
        .unwrap();
        let msg = MsgCreateClawbackVestingAccount {
            funder: addr("funder"),
            to_address: addr("grantee"),
            amount: stake(100),
            start_time: Some(0),
            end_time: 51,
        };
        let ctx = ledger.block();
        let err = engine
            .create_vesting_account(&mut ledger, &ctx, &msg)
            .unwrap_err();
        assert!(matches!(err, ClawbackError::InvalidSchedule { .. }));
    }

    enum Fault {
        /// Report every delegation transfer as done without moving shares.
        MoveNothing,
        /// Fail every delegation transfer.
        Reject,
    }

    /// Ledger wrapper whose delegation transfers misbehave.
    struct Faulty<'a> {
        inner: &'a mut Ledger,
        fault: Fault,
        delegation_calls: usize,
    }

    impl<'a> Faulty<'a> {
        fn new(inner: &'a mut Ledger, fault: Fault) -> Self {
            Self {
                inner,
                fault,
                delegation_calls: 0,
            }
        }
    }

    impl AccountKeeper for Faulty<'_> {
        fn account(&self, addr: &Address) -> Option<Account> {
            self.inner.account(addr)
        }
        fn set_account(&mut self, account: Account) {
            self.inner.set_account(account);
        }
    }

    impl BankKeeper for Faulty<'_> {
        fn spendable_balance(&self, addr: &Address) -> Coins {
            self.inner.spendable_balance(addr)
        }
        fn all_balances(&self, addr: &Address) -> Coins {
            self.inner.all_balances(addr)
        }
        fn send_enabled(&self, denom: &str) -> bool {
            self.inner.send_enabled(denom)
        }
        fn transfer(&mut self, from: &Address, to: &Address, amount: &Coins) -> Result<()> {
            self.inner.transfer(from, to, amount)
        }
    }

    impl StakingKeeper for Faulty<'_> {
        fn bond_denom(&self) -> Denom {
            self.inner.bond_denom()
        }
        fn bonded_amount(&self, delegator: &Address) -> Result<Amount> {
            self.inner.bonded_amount(delegator)
        }
        fn unbonding_amount(&self, delegator: &Address) -> Result<Amount> {
            self.inner.unbonding_amount(delegator)
        }
        fn unbonding_delegations(&self, delegator: &Address, limit: u16) -> Vec<UnbondingDelegation> {
            self.inner.unbonding_delegations(delegator, limit)
        }
        fn delegations(&self, delegator: &Address, limit: u16) -> Vec<Delegation> {
            self.inner.delegations(delegator, limit)
        }
        fn validator(&self, addr: &ValidatorAddress) -> Option<Validator> {
            self.inner.validator(addr)
        }
        fn shares_for_tokens_truncated(&self, validator: &Validator, tokens: Amount) -> Result<Shares> {
            self.inner.shares_for_tokens_truncated(validator, tokens)
        }
        fn tokens_for_shares_round_up(&self, validator: &Validator, shares: Shares) -> Result<Amount> {
            self.inner.tokens_for_shares_round_up(validator, shares)
        }
        fn transfer_unbonding(
            &mut self,
            from: &Address,
            to: &Address,
            validator: &ValidatorAddress,
            want: Amount,
        ) -> Result<Amount> {
            self.inner.transfer_unbonding(from, to, validator, want)
        }
        fn transfer_delegation(
            &mut self,
            from: &Address,
            _to: &Address,
            validator: &ValidatorAddress,
            _want_shares: Shares,
        ) -> Result<Shares> {
            self.delegation_calls += 1;
            match self.fault {
                Fault::MoveNothing => Ok(Shares::ZERO),
                Fault::Reject => Err(ClawbackError::DelegationNotFound {
                    delegator: from.clone(),
                    validator: validator.clone(),
                }),
            }
        }
    }

    #[test]
    fn unmet_target_is_fatal() {
        let (mut ledger, engine) = setup(10_000);
        let v1 = ValidatorAddress::new("val1").unwrap();
        ledger.add_validator(v1.clone());
        ledger.delegate(&addr("grantee"), &v1, 10_000).unwrap();
        let ctx = ledger.advance_to(30).unwrap();

        let mut host = Faulty::new(&mut ledger, Fault::MoveNothing);
        let err = engine
            .clawback(&mut host, &ctx, &claw("funder", "grantee"))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.code(), "CB_ERR_900");
    }

    #[test]
    fn failed_delegation_transfer_aborts_and_rolls_back() {
        let (mut ledger, engine) = setup(10_000);
        let (v1, v2) = (
            ValidatorAddress::new("val1").unwrap(),
            ValidatorAddress::new("val2").unwrap(),
        );
        ledger.add_validator(v1.clone());
        ledger.add_validator(v2.clone());
        ledger.delegate(&addr("grantee"), &v1, 5_000).unwrap();
        ledger.delegate(&addr("grantee"), &v2, 5_000).unwrap();
        let ctx = ledger.advance_to(10).unwrap();

        let mut calls = 0;
        let err = ledger
            .execute(|l| {
                let mut host = Faulty::new(l, Fault::Reject);
                let out = engine.clawback(&mut host, &ctx, &claw("funder", "grantee"));
                calls = host.delegation_calls;
                out
            })
            .unwrap_err();

        assert!(matches!(
            &err,
            ClawbackError::DelegationNotFound { delegator, validator }
                if delegator == &addr("grantee") && validator == &v1
        ));
        assert!(!err.is_fatal());
        // val2 is never tried.
        assert_eq!(calls, 1);
        assert_eq!(ledger.bonded_amount(&addr("grantee")).unwrap(), 10_000);
        assert!(ledger.all_balances(&addr("funder")).is_zero());
        let grant = ledger.account(&addr("grantee")).unwrap();
        let grant = grant.as_vesting().unwrap();
        assert_eq!(grant.end_time, 100);
        assert_eq!(grant.original_vesting, stake(10_000));
        ledger.verify_supply("stake").unwrap();
    }
}
