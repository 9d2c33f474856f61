//! # clawback-vesting
//!
//! **Vesting Account Model** and **Vesting Projection** for the clawback
//! settlement engine, plus the capability traits through which the engine
//! reaches its collaborators.
//!
//! ## Architecture
//!
//! 1. **schedule**: pure linear projection of a grant at a point in time
//! 2. **account**: the [`Account`] variants, the grant bookkeeping carried by
//!    [`ClawbackVestingAccount`], and delegation tracking
//! 3. **keepers**: [`AccountKeeper`], [`BankKeeper`], [`StakingKeeper`] and
//!    the staking records they report
//!
//! ```text
//! Host (bank + staking + accounts) ──implements──▶ keepers::Host
//!                                                       │
//!                   ClawbackVestingAccount ◀── schedule ┘
//! ```

pub mod account;
pub mod keepers;
pub mod schedule;

pub use account::{Account, BaseAccount, ClawbackVestingAccount};
pub use keepers::{
    AccountKeeper, BankKeeper, Delegation, Host, StakingKeeper, UnbondingDelegation,
    UnbondingEntry, Validator,
};
pub use schedule::{vested_amount, vesting_amount};
