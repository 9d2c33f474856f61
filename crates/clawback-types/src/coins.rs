//! Multi-denomination token amounts.
//!
//! [`Coins`] is a set of `(denom, amount)` pairs with integer amounts. It is
//! kept sorted by denomination and never stores a zero entry, so two equal
//! sets always compare, serialize and iterate identically on every node.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClawbackError, Result, constants};

/// Type alias for denomination identifiers (e.g., "stake", "uatom").
pub type Denom = String;

/// Integer token amount.
pub type Amount = u128;

/// Validate a denomination: a lowercase letter followed by lowercase
/// alphanumerics or `/`, between 3 and 128 characters.
pub fn validate_denom(denom: &str) -> Result<()> {
    let len_ok = (constants::MIN_DENOM_LEN..=constants::MAX_DENOM_LEN).contains(&denom.len());
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '/');
    if len_ok && first_ok && rest_ok {
        Ok(())
    } else {
        Err(ClawbackError::InvalidDenom(denom.to_string()))
    }
}

/// A sorted, zero-free multiset of token amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Denom, Amount>", into = "BTreeMap<Denom, Amount>")]
pub struct Coins(BTreeMap<Denom, Amount>);

impl Coins {
    /// The empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A single-denomination amount. A zero amount yields the empty set.
    pub fn from_coin(denom: &str, amount: Amount) -> Result<Self> {
        validate_denom(denom)?;
        let mut coins = Self::new();
        if amount > 0 {
            coins.0.insert(denom.to_string(), amount);
        }
        Ok(coins)
    }

    /// Build from `(denom, amount)` pairs, merging duplicate denominations
    /// and dropping zero amounts.
    pub fn try_from_pairs<I, D>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (D, Amount)>,
        D: Into<Denom>,
    {
        let mut coins = Self::new();
        for (denom, amount) in pairs {
            let denom = denom.into();
            validate_denom(&denom)?;
            if amount == 0 {
                continue;
            }
            let slot = coins.0.entry(denom).or_insert(0);
            *slot = slot
                .checked_add(amount)
                .ok_or_else(|| ClawbackError::ArithmeticOverflow("coin merge".into()))?;
        }
        Ok(coins)
    }

    /// Amount held in `denom` (zero if absent).
    #[must_use]
    pub fn amount_of(&self, denom: &str) -> Amount {
        self.0.get(denom).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of non-zero denominations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in denomination order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.0.iter().map(|(d, a)| (d.as_str(), *a))
    }

    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Everything except the `denom` component.
    #[must_use]
    pub fn without(&self, denom: &str) -> Self {
        let mut coins = self.clone();
        coins.0.remove(denom);
        coins
    }

    /// Apply `f` to every amount, keeping the denominations and dropping
    /// results that come out zero.
    #[must_use]
    pub fn map_amounts(&self, mut f: impl FnMut(&str, Amount) -> Amount) -> Self {
        let inner = self
            .0
            .iter()
            .filter_map(|(denom, amount)| {
                let mapped = f(denom, *amount);
                (mapped > 0).then(|| (denom.clone(), mapped))
            })
            .collect();
        Self(inner)
    }

    /// Per-denomination sum.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        for (denom, amount) in &other.0 {
            let slot = out.0.entry(denom.clone()).or_insert(0);
            *slot = slot
                .checked_add(*amount)
                .ok_or_else(|| ClawbackError::ArithmeticOverflow(format!("{denom} addition")))?;
        }
        Ok(out)
    }

    /// Per-denomination difference; fails if any denomination would go
    /// negative.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        if !self.is_all_gte(other) {
            return Err(ClawbackError::CoinsUnderflow {
                minuend: self.clone(),
                subtrahend: other.clone(),
            });
        }
        Ok(self.saturating_sub(other))
    }

    /// Per-denomination difference floored at zero.
    #[must_use]
    pub fn saturating_sub(&self, other: &Self) -> Self {
        let inner = self
            .0
            .iter()
            .filter_map(|(denom, amount)| {
                let left = amount.saturating_sub(other.amount_of(denom));
                (left > 0).then(|| (denom.clone(), left))
            })
            .collect();
        Self(inner)
    }

    /// Per-denomination minimum. Denominations missing on either side are
    /// zero and therefore dropped.
    #[must_use]
    pub fn min(&self, other: &Self) -> Self {
        let inner = self
            .0
            .iter()
            .filter_map(|(denom, amount)| {
                let m = (*amount).min(other.amount_of(denom));
                (m > 0).then(|| (denom.clone(), m))
            })
            .collect();
        Self(inner)
    }

    /// Whether every denomination of `other` is covered by `self`.
    #[must_use]
    pub fn is_all_gte(&self, other: &Self) -> bool {
        other.iter().all(|(denom, amount)| self.amount_of(denom) >= amount)
    }
}

impl TryFrom<BTreeMap<Denom, Amount>> for Coins {
    type Error = ClawbackError;

    fn try_from(map: BTreeMap<Denom, Amount>) -> Result<Self> {
        Self::try_from_pairs(map)
    }
}

impl From<Coins> for BTreeMap<Denom, Amount> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("0");
        }
        let mut first = true;
        for (denom, amount) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}
