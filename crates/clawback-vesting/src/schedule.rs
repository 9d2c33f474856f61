//! Linear vesting projection.
//!
//! ```text
//! fraction = clamp((now - start) / (end - start), 0, 1)
//! vested   = floor(original * fraction)
//! vesting  = original - vested
//! ```
//!
//! The product is computed exactly in integers, so `vested` is exactly zero
//! at or before `start` and exactly `original` at or after `end`.

use clawback_types::{Amount, Coins};

/// `floor(amount * elapsed / duration)` without overflow.
///
/// Requires `elapsed <= duration` and `duration > 0`. Splitting
/// `amount = q * duration + r` keeps both partial products in range:
/// `q * elapsed <= amount` and `r * elapsed < duration^2 < 2^128`.
fn mul_div_floor(amount: Amount, elapsed: u128, duration: u128) -> Amount {
    let q = amount / duration;
    let r = amount % duration;
    q * elapsed + r * elapsed / duration
}

/// Portion of `original` vested at `now` under a linear schedule from
/// `start` to `end` (seconds since epoch).
///
/// A degenerate schedule (`end <= start`) counts as fully vested once
/// `now >= end`, which is the state a force-completed grant is left in.
#[must_use]
pub fn vested_amount(original: &Coins, start: i64, end: i64, now: i64) -> Coins {
    if now >= end {
        return original.clone();
    }
    if now <= start {
        return Coins::new();
    }
    // start < now < end here, so both differences are positive.
    let duration = (i128::from(end) - i128::from(start)).unsigned_abs();
    let elapsed = (i128::from(now) - i128::from(start)).unsigned_abs();
    original.map_amounts(|_, amount| mul_div_floor(amount, elapsed, duration))
}

/// Portion of `original` still vesting at `now`.
#[must_use]
pub fn vesting_amount(original: &Coins, start: i64, end: i64, now: i64) -> Coins {
    original.saturating_sub(&vested_amount(original, start, end, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn stake(n: Amount) -> Coins {
        Coins::from_coin("stake", n).unwrap()
    }

    #[test]
    fn nothing_vested_at_or_before_start() {
        let g = stake(10_000);
        assert!(vested_amount(&g, 0, 100, 0).is_zero());
        assert!(vested_amount(&g, 50, 100, -10).is_zero());
        assert_eq!(vesting_amount(&g, 0, 100, 0), g);
    }

    #[test]
    fn everything_vested_at_or_after_end() {
        let g = stake(10_000);
        assert_eq!(vested_amount(&g, 0, 100, 100), g);
        assert_eq!(vested_amount(&g, 0, 100, 1_000), g);
        assert!(vesting_amount(&g, 0, 100, 100).is_zero());
    }

    #[test]
    fn linear_midpoints() {
        let g = stake(10_000);
        assert_eq!(vested_amount(&g, 0, 100, 30), stake(3_000));
        assert_eq!(vesting_amount(&g, 0, 100, 30), stake(7_000));
        let g = stake(27_500);
        assert_eq!(vesting_amount(&g, 0, 100, 60), stake(11_000));
    }

    #[test]
    fn vested_is_floored() {
        // 10 * 1/3 = 3.33.. -> 3
        let g = stake(10);
        assert_eq!(vested_amount(&g, 0, 3, 1), stake(3));
        assert_eq!(vesting_amount(&g, 0, 3, 1), stake(7));
    }

    #[test]
    fn huge_amounts_do_not_overflow() {
        let g = stake(Amount::MAX);
        let vested = vested_amount(&g, i64::MIN, i64::MAX, 0);
        let vesting = vesting_amount(&g, i64::MIN, i64::MAX, 0);
        assert_eq!(
            vested.amount_of("stake") + vesting.amount_of("stake"),
            Amount::MAX
        );
        assert!(vested.amount_of("stake") < Amount::MAX);
    }

    #[test]
    fn degenerate_schedule_is_fully_vested() {
        let g = stake(500);
        assert_eq!(vested_amount(&g, 40, 40, 40), g);
        assert_eq!(vested_amount(&g, 40, 30, 35), g);
    }

    #[test]
    fn multi_denom_independent() {
        let g = Coins::try_from_pairs([("stake", 1_000), ("uatom", 10)]).unwrap();
        let vested = vested_amount(&g, 0, 100, 25);
        assert_eq!(vested.amount_of("stake"), 250);
        assert_eq!(vested.amount_of("uatom"), 2);
    }

    #[test]
    fn random_schedules_conserve_and_are_monotonic() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let original = stake(rng.gen_range(1..=1_000_000_000_000u128));
            let start: i64 = rng.gen_range(-1_000..1_000);
            let end = start + rng.gen_range(1..100_000);
            let mut prev = Coins::new();
            for t in [start - 1, start, (start + end) / 2, end - 1, end, end + 7] {
                let vested = vested_amount(&original, start, end, t);
                let vesting = vesting_amount(&original, start, end, t);
                assert_eq!(vested.checked_add(&vesting).unwrap(), original);
                assert!(vested.is_all_gte(&prev), "vested went down at t={t}");
                prev = vested;
            }
        }
    }
}
