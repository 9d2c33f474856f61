//! Validator shares and the wide multiply-divide behind share pricing.
//!
//! [`Shares`] are fixed point with [`SHARE_DECIMALS`](constants::SHARE_DECIMALS)
//! fractional digits, stored as a raw count of `1 / SHARE_SCALE` units.
//! Conversions against token amounts multiply in 256 bits, so the product
//! never overflows and the only rounding is the explicit floor or ceil:
//!
//! ```text
//! mul_div_floor(a, b, d) = ⌊a·b / d⌋
//! mul_div_ceil(a, b, d)  = ⌈a·b / d⌉
//! ```

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Amount, ClawbackError, Result, constants};

fn overflow(what: &str) -> ClawbackError {
    ClawbackError::ArithmeticOverflow(what.to_string())
}

fn wide_product(a: u128, b: u128) -> Result<U256> {
    U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or_else(|| overflow("256-bit product"))
}

fn narrow(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(overflow("mul_div result exceeds u128"));
    }
    Ok(value.low_u128())
}

/// `⌊a·b / d⌋`, exact.
///
/// # Errors
/// `ArithmeticOverflow` when `d` is zero or the quotient exceeds `u128`.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(overflow("mul_div by zero"));
    }
    narrow(wide_product(a, b)? / U256::from(d))
}

/// `⌈a·b / d⌉`, exact.
///
/// # Errors
/// `ArithmeticOverflow` when `d` is zero or the quotient exceeds `u128`.
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(overflow("mul_div by zero"));
    }
    let (q, r) = wide_product(a, b)?.div_mod(U256::from(d));
    let q = if r.is_zero() { q } else { q + U256::one() };
    narrow(q)
}

/// A fixed-point share count.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Shares(u128);

impl Shares {
    pub const ZERO: Self = Self(0);

    /// From a raw count of `1 / SHARE_SCALE` units.
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// One whole share per token, the price of a validator with no shares
    /// issued yet.
    pub fn from_tokens(amount: Amount) -> Result<Self> {
        amount
            .checked_mul(constants::SHARE_SCALE)
            .map(Self)
            .ok_or_else(|| overflow("shares for tokens"))
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| overflow("share addition"))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| overflow("share subtraction"))
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / constants::SHARE_SCALE;
        let frac = self.0 % constants::SHARE_SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:0width$}", width = constants::SHARE_DECIMALS);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_ceil_differ_only_on_remainder() {
        assert_eq!(mul_div_floor(7, 400, 300).unwrap(), 9);
        assert_eq!(mul_div_ceil(7, 400, 300).unwrap(), 10);
        assert_eq!(mul_div_floor(6, 400, 300).unwrap(), 8);
        assert_eq!(mul_div_ceil(6, 400, 300).unwrap(), 8);
    }

    #[test]
    fn product_beyond_u128_is_exact() {
        assert_eq!(mul_div_floor(u128::MAX, u128::MAX, u128::MAX).unwrap(), u128::MAX);
        let big = 4 * 10u128.pow(36);
        assert_eq!(mul_div_floor(big, 3 * 10u128.pow(18), big).unwrap(), 3 * 10u128.pow(18));
    }

    #[test]
    fn quotient_overflow_and_zero_divisor_rejected() {
        assert!(matches!(
            mul_div_floor(u128::MAX, 2, 1),
            Err(ClawbackError::ArithmeticOverflow(_))
        ));
        assert!(mul_div_ceil(u128::MAX, u128::MAX, u128::MAX - 1).is_err());
        assert!(mul_div_floor(1, 1, 0).is_err());
    }

    #[test]
    fn display_trims_fraction() {
        assert_eq!(Shares::from_tokens(400).unwrap().to_string(), "400");
        assert_eq!(Shares::from_raw(9_333_333_333_333_333_333).to_string(), "9.333333333333333333");
        assert_eq!(Shares::from_raw(1_500_000_000_000_000_000).to_string(), "1.5");
        assert_eq!(Shares::from_raw(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn whole_share_scale() {
        assert_eq!(Shares::from_tokens(1).unwrap().raw(), constants::SHARE_SCALE);
        assert!(Shares::from_tokens(u128::MAX).is_err());
        assert!(Shares::ZERO.checked_sub(Shares::from_raw(1)).is_err());
    }

    #[test]
    fn serde_is_raw_integer() {
        let s = Shares::from_raw(42);
        assert_eq!(serde_json::to_string(&s).unwrap(), "42");
        let back: Shares = serde_json::from_str("42").unwrap();
        assert_eq!(back, s);
    }
}
