//! Error types for the clawback settlement engine.
//!
//! All errors use the `CB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors (no state mutated)
//! - 2xx: Bank collaborator errors
//! - 3xx: Staking collaborator errors
//! - 9xx: Internal / fatal errors

use thiserror::Error;

use crate::{Address, Coins, Shares, ValidatorAddress};

/// Central error enum for all clawback operations.
#[derive(Debug, Error)]
pub enum ClawbackError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The address is empty, too long or contains invalid characters.
    #[error("CB_ERR_100: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    /// The denomination does not follow the denom format.
    #[error("CB_ERR_101: Invalid denomination: {0:?}")]
    InvalidDenom(String),

    /// The coin set is empty or otherwise unusable for this operation.
    #[error("CB_ERR_102: Invalid coins: {reason}")]
    InvalidCoins { reason: String },

    /// The vesting schedule's start/end times are inconsistent.
    #[error("CB_ERR_103: Invalid vesting schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// No account is stored at the address.
    #[error("CB_ERR_104: Account not found: {0}")]
    AccountNotFound(Address),

    /// The account exists but carries no vesting grant.
    #[error("CB_ERR_105: Account {0} is not a clawback vesting account")]
    NotVestingAccount(Address),

    /// The requester is not the grant's registered funder.
    #[error("CB_ERR_106: {requester} is not the funder of {account}")]
    NotFunder {
        requester: Address,
        account: Address,
    },

    /// The grant has nothing left vesting.
    #[error("CB_ERR_107: Nothing to claw back from {0}")]
    NothingToClawBack(Address),

    /// An account already exists where a new grant would be created.
    #[error("CB_ERR_108: Account already exists: {0}")]
    AccountExists(Address),

    /// The recipient is on the blocked-address list.
    #[error("CB_ERR_109: {0} is not allowed to receive funds")]
    BlockedAddress(Address),

    // =================================================================
    // Bank Errors (2xx)
    // =================================================================
    /// The sender's spendable balance does not cover the transfer.
    #[error("CB_ERR_200: Insufficient funds in {address}: need {needed}, spendable {available}")]
    InsufficientFunds {
        address: Address,
        needed: Coins,
        available: Coins,
    },

    /// Transfers of this denomination are disabled.
    #[error("CB_ERR_201: Transfers disabled for denomination {0}")]
    SendDisabled(String),

    /// A coin subtraction would go negative.
    #[error("CB_ERR_202: Coin underflow: {minuend} - {subtrahend}")]
    CoinsUnderflow { minuend: Coins, subtrahend: Coins },

    // =================================================================
    // Staking Errors (3xx)
    // =================================================================
    /// The validator is not in the staking records.
    #[error("CB_ERR_300: Validator not found: {0}")]
    ValidatorNotFound(ValidatorAddress),

    /// No delegation from `delegator` to `validator`.
    #[error("CB_ERR_301: No delegation from {delegator} to {validator}")]
    DelegationNotFound {
        delegator: Address,
        validator: ValidatorAddress,
    },

    /// More shares were requested than the delegation holds.
    #[error("CB_ERR_303: Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: Shares,
        available: Shares,
    },

    /// A token/share conversion could not be represented.
    #[error("CB_ERR_304: Share conversion failed: {reason}")]
    ShareConversion { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Accounting invariant broken. Fatal: the enclosing transaction must
    /// be discarded.
    #[error("CB_ERR_900: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// Integer overflow in token arithmetic.
    #[error("CB_ERR_901: Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Configuration error (invalid config file, bad values).
    #[error("CB_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("CB_ERR_903: Serialization error: {0}")]
    Serialization(String),
}

impl ClawbackError {
    /// Whether this error signals an accounting defect rather than a
    /// rejected request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    /// The stable `CB_ERR_xxx` code of this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "CB_ERR_100",
            Self::InvalidDenom(_) => "CB_ERR_101",
            Self::InvalidCoins { .. } => "CB_ERR_102",
            Self::InvalidSchedule { .. } => "CB_ERR_103",
            Self::AccountNotFound(_) => "CB_ERR_104",
            Self::NotVestingAccount(_) => "CB_ERR_105",
            Self::NotFunder { .. } => "CB_ERR_106",
            Self::NothingToClawBack(_) => "CB_ERR_107",
            Self::AccountExists(_) => "CB_ERR_108",
            Self::BlockedAddress(_) => "CB_ERR_109",
            Self::InsufficientFunds { .. } => "CB_ERR_200",
            Self::SendDisabled(_) => "CB_ERR_201",
            Self::CoinsUnderflow { .. } => "CB_ERR_202",
            Self::ValidatorNotFound(_) => "CB_ERR_300",
            Self::DelegationNotFound { .. } => "CB_ERR_301",
            Self::InsufficientShares { .. } => "CB_ERR_303",
            Self::ShareConversion { .. } => "CB_ERR_304",
            Self::InvariantViolation { .. } => "CB_ERR_900",
            Self::ArithmeticOverflow(_) => "CB_ERR_901",
            Self::Configuration(_) => "CB_ERR_902",
            Self::Serialization(_) => "CB_ERR_903",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ClawbackError>;

impl From<serde_json::Error> for ClawbackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
