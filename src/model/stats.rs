use crate::sync::{Collection, Record};
use serde::{Deserialize, Serialize};

/// The level every new user starts at.
pub const STARTING_LEVEL: u32 = 1;

/// XP needed to leave the starting level.
pub const STARTING_XP_TO_NEXT_LEVEL: u32 = 100;

/// Each level needs this much more XP than the one before.
pub const XP_STEP_PER_LEVEL: u32 = 50;

/// A user's gamified progress. There is exactly one per user.
///
/// `longest_streak` is a high-water mark of `daily_streak` and never decreases.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserStats {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub daily_streak: u32,
    pub longest_streak: u32,
    pub goals_completed: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: STARTING_LEVEL,
            xp: 0,
            xp_to_next_level: STARTING_XP_TO_NEXT_LEVEL,
            daily_streak: 0,
            longest_streak: 0,
            goals_completed: 0,
        }
    }
}

impl UserStats {
    /// Fraction of the way to the next level, in `[0, 1]`.
    pub fn level_progress(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        (f64::from(self.xp) / f64::from(self.xp_to_next_level)).clamp(0.0, 1.0)
    }

    /// All XP earned so far: the thresholds of every level already passed plus the current `xp`.
    pub fn total_xp(&self) -> u64 {
        let passed = u64::from(self.level.saturating_sub(STARTING_LEVEL));
        let step = u64::from(XP_STEP_PER_LEVEL);
        // Arithmetic series of the thresholds 100, 150, 200, ...
        let thresholds = passed * u64::from(STARTING_XP_TO_NEXT_LEVEL)
            + step * passed * passed.saturating_sub(1) / 2;
        thresholds + u64::from(self.xp)
    }
}

impl Record for UserStats {
    const COLLECTION: Collection = Collection::Stats;
    const SCHEMA_VERSION: u32 = 1;
}
