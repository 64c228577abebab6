//! Deterministic random number generator for quest rotation
//!
//! Uses a simple xorshift64 algorithm for reproducibility across platforms.
//! Daily rotation must be a pure function of (account, day) so that
//! redundant or concurrent refresh calls converge on the same selection.

use crate::AccountId;
use serde::{Deserialize, Serialize};

/// A deterministic random number generator
///
/// Never use std::random or other non-deterministic sources for rotation
/// logic; two server instances refreshing the same account on the same day
/// must pick the same quests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationRng {
    state: u64,
}

impl RotationRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // Ensure non-zero state (xorshift requires this)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Seed from an account and a day ordinal (days since epoch)
    ///
    /// SplitMix64-style finalizer so adjacent (account, day) pairs do not
    /// produce correlated streams.
    pub fn for_rotation(account: AccountId, day_ordinal: i64) -> Self {
        let mut z = account
            .raw()
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(day_ordinal as u64);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self::new(z ^ (z >> 31))
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64 algorithm
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Shuffle a slice in place (Fisher-Yates)
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = (self.next_u64() as usize) % (i + 1);
            slice.swap(i, j);
        }
    }

    /// Pick a random element from a slice
    pub fn pick<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let i = (self.next_u64() as usize) % slice.len();
            Some(&slice[i])
        }
    }
}
