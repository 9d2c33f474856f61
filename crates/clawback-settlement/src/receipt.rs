//! Clawback receipts for the audit trail.
//!
//! Every successful clawback produces a [`ClawbackReceipt`] carrying a
//! SHA-256 digest over its contents, so a stored receipt can be checked
//! for tampering later.

use chrono::{DateTime, Utc};
use clawback_types::{Address, BlockContext, ClawbackResult, Coins, constants};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Proof that a clawback executed and what it recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClawbackReceipt {
    pub funder: Address,
    pub account: Address,
    pub height: u64,
    pub block_time: DateTime<Utc>,
    /// Unvested amount at the moment of the clawback, before slashing caps.
    pub total_vesting: Coins,
    pub result: ClawbackResult,
    /// SHA-256 over every field above.
    pub digest: [u8; 32],
}

impl ClawbackReceipt {
    #[must_use]
    pub fn new(
        funder: Address,
        account: Address,
        ctx: &BlockContext,
        total_vesting: Coins,
        result: ClawbackResult,
    ) -> Self {
        let mut receipt = Self {
            funder,
            account,
            height: ctx.height,
            block_time: ctx.time,
            total_vesting,
            result,
            digest: [0u8; 32],
        };
        receipt.digest = receipt.compute_digest();
        receipt
    }

    /// Hash commits to:
    /// - funder and account addresses (NUL-terminated)
    /// - block height and time
    /// - total vesting, then each pool, each prefixed by a one-byte tag
    fn compute_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(constants::RECEIPT_DOMAIN);
        hasher.update(self.funder.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.account.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.block_time.timestamp().to_le_bytes());

        let pools = [
            (0u8, &self.total_vesting),
            (1, &self.result.liquid),
            (2, &self.result.unbonding),
            (3, &self.result.delegated),
        ];
        for (tag, coins) in pools {
            hasher.update([tag]);
            let count = u64::try_from(coins.len()).unwrap_or(u64::MAX);
            hasher.update(count.to_le_bytes());
            for (denom, amount) in coins.iter() {
                hasher.update(denom.as_bytes());
                hasher.update([0u8]);
                hasher.update(amount.to_le_bytes());
            }
        }

        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Recompute the digest and compare it to the stored one.
    #[must_use]
    pub fn verify_digest(&self) -> bool {
        self.compute_digest() == self.digest
    }

    /// Sum of all three pools.
    pub fn recovered(&self) -> clawback_types::Result<Coins> {
        self.result.total()
    }
}
