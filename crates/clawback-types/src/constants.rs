//! System-wide constants for the clawback settlement engine.

/// Maximum length of an account or validator address string.
pub const MAX_ADDRESS_LEN: usize = 255;

/// Minimum length of a denomination.
pub const MIN_DENOM_LEN: usize = 3;

/// Maximum length of a denomination.
pub const MAX_DENOM_LEN: usize = 128;

/// Default cap on unbonding / delegation entries enumerated per clawback.
pub const DEFAULT_ENTRY_LIMIT: u16 = u16::MAX;

/// Default upper bound on a new grant's schedule length (100 years).
pub const DEFAULT_MAX_VESTING_DURATION_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Fractional digits of a validator share.
pub const SHARE_DECIMALS: usize = 18;

/// Raw share units per whole share (`10^SHARE_DECIMALS`).
pub const SHARE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Domain separator for clawback receipt digests.
pub const RECEIPT_DOMAIN: &[u8] = b"clawback:receipt:v1:";
