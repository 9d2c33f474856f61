//! # clawback-ledger
//!
//! **In-memory reference host** for the clawback engine. A single
//! [`Ledger`] stores accounts, balances, validators, delegations and
//! unbonding entries, and implements every capability trait from
//! `clawback-vesting::keepers`.
//!
//! ## Architecture
//!
//! 1. **ledger**: block context, account storage, atomic [`Ledger::execute`]
//! 2. **bank**: balances, vesting-aware spendable balance, transfers
//! 3. **staking**: validators, delegate / undelegate / slash, share math
//! 4. **supply**: per-denomination supply conservation tracking
//!
//! Transactions run through [`Ledger::execute`]: on any error the ledger is
//! restored to its state before the transaction, so a failed clawback never
//! leaves partially drained state behind.

pub mod bank;
pub mod ledger;
pub mod staking;
pub mod supply;

pub use ledger::Ledger;
pub use supply::SupplyConservation;
