//! Account and validator addresses.
//!
//! Addresses are opaque strings owned by the account collaborator. This
//! module only enforces the shape every address must have: non-empty,
//! bounded length, lowercase ASCII alphanumerics. Deserialization goes
//! through the same check, so a malformed address never reaches the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClawbackError, Result, constants};

fn validate(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(ClawbackError::InvalidAddress {
            reason: "address is empty".into(),
        });
    }
    if raw.len() > constants::MAX_ADDRESS_LEN {
        return Err(ClawbackError::InvalidAddress {
            reason: format!(
                "address length {} exceeds {}",
                raw.len(),
                constants::MAX_ADDRESS_LEN
            ),
        });
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
    {
        return Err(ClawbackError::InvalidAddress {
            reason: format!("invalid character {bad:?} in {raw:?}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an account address.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = ClawbackError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ValidatorAddress
// ---------------------------------------------------------------------------

/// A validator operator address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidatorAddress(String);

impl ValidatorAddress {
    /// Parse and validate a validator address.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ValidatorAddress {
    type Error = ClawbackError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<ValidatorAddress> for String {
    fn from(addr: ValidatorAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for ValidatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "val:{}", self.0)
    }
}
