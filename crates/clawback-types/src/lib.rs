//! # clawback-types
//!
//! Shared types, errors, and configuration for the **clawback settlement
//! engine**.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`ValidatorAddress`]
//! - **Token amounts**: [`Coins`], [`Amount`], [`Denom`]
//! - **Validator shares**: [`Shares`] and exact [`mul_div_floor`] / [`mul_div_ceil`]
//! - **Messages**: [`MsgCreateClawbackVestingAccount`], [`MsgClawback`], [`ClawbackResult`]
//! - **Execution context**: [`BlockContext`]
//! - **Configuration**: [`ClawbackConfig`]
//! - **Errors**: [`ClawbackError`] with `CB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod address;
pub mod coins;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod msg;
pub mod shares;

pub use address::*;
pub use coins::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use msg::*;
pub use shares::*;

// Constants are accessed via `clawback_types::constants::FOO`
// (not re-exported to avoid name collisions).
