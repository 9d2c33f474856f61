//! # clawback-settlement
//!
//! **Settlement Algorithm**: recovers the unvested remainder of a vesting
//! grant for its funder, wherever those tokens currently sit.
//!
//! ## Architecture
//!
//! The [`ClawbackEngine`] receives a [`MsgClawback`](clawback_types::MsgClawback) and:
//! 1. Checks preconditions (account, variant, funder, something vesting)
//! 2. Force-completes the grant's schedule at block time
//! 3. Reconciles the delegation split against slashing losses
//! 4. Drains liquid balance, then unbonding entries, then delegations
//! 5. Verifies the drain target was met exactly (fatal otherwise)
//! 6. Issues a [`ClawbackReceipt`] for the audit trail
//!
//! ## Drain Order
//!
//! ```text
//! to_claw_back ──▶ liquid ──▶ unbonding ──▶ delegated ──▶ want == 0 ?
//!                  (bank)     (staking)     (staking,       │
//!                                            shares)        └─▶ abort tx
//! ```
//!
//! The engine holds no state between calls. Atomic commit or rollback of a
//! failed call is the host's responsibility.

pub mod drain;
pub mod engine;
pub mod receipt;
pub mod reconcile;

pub use engine::ClawbackEngine;
pub use receipt::ClawbackReceipt;
pub use reconcile::{Reconciliation, reconcile};
