//! Level curve and progress computation
//!
//! Cumulative XP required to reach level L is `50 * L * (L + 1)`, a
//! progressive curve: level 2 opens at 300 XP, level 3 at 600, level 4 at
//! 1000, and so on. Level 1 is the floor; any account below 300 XP is
//! level 1. The inversion is closed-form via the quadratic formula, then
//! nudged to correct for float rounding.

use serde::{Deserialize, Serialize};

/// Cumulative XP required to reach a level
///
/// Level 1 is the starting level and requires no XP.
pub fn xp_floor(level: u32) -> u64 {
    if level <= 1 {
        0
    } else {
        50 * level as u64 * (level as u64 + 1)
    }
}

/// The highest level whose XP floor is at or below the given total
///
/// Monotonically non-decreasing in `xp`; `level_for_xp(0) == 1`.
pub fn level_for_xp(xp: u64) -> u32 {
    if xp < xp_floor(2) {
        return 1;
    }
    // Solve 50L^2 + 50L <= xp for the largest integer L
    let x = xp as f64 / 50.0;
    let mut level = ((-1.0 + (1.0 + 4.0 * x).sqrt()) / 2.0).floor() as u32;
    // Guard against float error on exact thresholds
    while xp_floor(level + 1) <= xp {
        level += 1;
    }
    while level > 1 && xp_floor(level) > xp {
        level -= 1;
    }
    level.max(1)
}

/// Position within the current level, for progress bars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Current level
    pub level: u32,
    /// Cumulative XP at which the current level began
    pub current_floor: u64,
    /// Cumulative XP at which the next level begins
    pub next_floor: u64,
    /// Progress through the current level, 0.0..=100.0
    pub percentage: f64,
}

impl LevelProgress {
    /// Compute progress for a cumulative XP total
    pub fn for_xp(xp: u64) -> Self {
        let level = level_for_xp(xp);
        let current_floor = xp_floor(level);
        let next_floor = xp_floor(level + 1);
        let span = (next_floor - current_floor) as f64;
        let percentage = ((xp - current_floor) as f64 / span * 100.0).clamp(0.0, 100.0);
        Self {
            level,
            current_floor,
            next_floor,
            percentage,
        }
    }
}
