//! XP, levels and daily streaks.
//!
//! The engine owns one `UserStats` and applies every transition to it. It does no I/O, the
//! `Session` persists the stats after each change.

use crate::model::{UserStats, XP_STEP_PER_LEVEL};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// XP awarded for logging in.
pub const LOGIN_XP: u32 = 5;

/// XP awarded for adding a transaction.
pub const TRANSACTION_XP: u32 = 10;

/// XP awarded for adding a budget.
pub const BUDGET_XP: u32 = 15;

/// Describes the outcome of one XP gain.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct XpGain {
    pub amount: u32,
    pub levels_gained: u32,
    /// The level after the gain.
    pub level: u32,
}

impl XpGain {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// What a login did to the streak.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// Logged in again on the same day.
    Unchanged,
    /// Logged in on the day after the previous login.
    Extended,
    /// A day or more was missed, or the previous login is in the future.
    Reset,
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Progress {
    stats: UserStats,
}

impl Progress {
    pub fn new(stats: UserStats) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// Adds `amount` XP, rolling over into as many levels as it covers.
    pub fn gain_xp(&mut self, amount: u32) -> XpGain {
        let stats = &mut self.stats;
        let mut levels_gained = 0;
        stats.xp = stats.xp.saturating_add(amount);
        while stats.xp_to_next_level > 0 && stats.xp >= stats.xp_to_next_level {
            stats.xp -= stats.xp_to_next_level;
            stats.level += 1;
            stats.xp_to_next_level += XP_STEP_PER_LEVEL;
            levels_gained += 1;
        }
        XpGain {
            amount,
            levels_gained,
            level: stats.level,
        }
    }

    /// Applies a login at `now` given the previous login at `last_login`, then awards the login XP.
    ///
    /// Days are counted as whole elapsed 24 hour periods, so a login 23 hours after the previous
    /// one counts as the same day even if the calendar date changed.
    pub fn update_streak_on_login(
        &mut self,
        last_login: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> (StreakChange, XpGain) {
        let days = (now - last_login).num_days();
        let change = match days {
            0 => StreakChange::Unchanged,
            1 => StreakChange::Extended,
            _ => StreakChange::Reset,
        };
        let stats = &mut self.stats;
        match change {
            StreakChange::Unchanged => {}
            StreakChange::Extended => stats.daily_streak += 1,
            StreakChange::Reset => stats.daily_streak = 1,
        }
        stats.longest_streak = stats.longest_streak.max(stats.daily_streak);
        let gain = self.gain_xp(LOGIN_XP);
        (change, gain)
    }

    pub fn award_transaction(&mut self) -> XpGain {
        self.gain_xp(TRANSACTION_XP)
    }

    /// Awards the budget XP and counts the budget as a completed goal.
    pub fn award_budget(&mut self) -> XpGain {
        self.stats.goals_completed += 1;
        self.gain_xp(BUDGET_XP)
    }

    /// Back to the starting stats.
    pub fn reset(&mut self) {
        self.stats = UserStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at_90() -> Progress {
        Progress::new(UserStats {
            level: 1,
            xp: 90,
            xp_to_next_level: 100,
            ..UserStats::default()
        })
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_gain_xp_single_level() {
        let mut p = at_90();
        let gain = p.gain_xp(15);
        assert_eq!(p.stats().level, 2);
        assert_eq!(p.stats().xp, 5);
        assert_eq!(p.stats().xp_to_next_level, 150);
        assert_eq!(gain.levels_gained, 1);
        assert_eq!(gain.level, 2);
        assert!(gain.leveled_up());
    }

    #[test]
    fn test_gain_xp_multi_level() {
        let mut p = at_90();
        let gain = p.gain_xp(160);
        assert_eq!(p.stats().level, 3);
        assert_eq!(p.stats().xp, 0);
        assert_eq!(p.stats().xp_to_next_level, 200);
        assert_eq!(gain.levels_gained, 2);
    }

    #[test]
    fn test_gain_zero_changes_nothing() {
        let mut p = at_90();
        let before = *p.stats();
        let gain = p.gain_xp(0);
        assert_eq!(*p.stats(), before);
        assert!(!gain.leveled_up());
    }

    #[test]
    fn test_xp_stays_below_threshold() {
        let mut p = Progress::default();
        for amount in [0, 1, 5, 10, 15, 99, 100, 101, 250, 1000, 7] {
            p.gain_xp(amount);
            let s = p.stats();
            assert!(s.xp < s.xp_to_next_level, "{s:?}");
        }
        assert_eq!(p.stats().total_xp(), 1588);
    }

    #[test]
    fn test_streak_extended_yesterday() {
        let mut p = Progress::new(UserStats {
            daily_streak: 3,
            longest_streak: 3,
            ..UserStats::default()
        });
        let (change, _) = p.update_streak_on_login(noon() - Duration::days(1), noon());
        assert_eq!(change, StreakChange::Extended);
        assert_eq!(p.stats().daily_streak, 4);
        assert_eq!(p.stats().longest_streak, 4);
        assert_eq!(p.stats().xp, LOGIN_XP);
    }

    #[test]
    fn test_streak_reset_after_gap() {
        let mut p = Progress::new(UserStats {
            daily_streak: 6,
            longest_streak: 9,
            ..UserStats::default()
        });
        let (change, _) = p.update_streak_on_login(noon() - Duration::days(3), noon());
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(p.stats().daily_streak, 1);
        assert_eq!(p.stats().longest_streak, 9);
    }

    #[test]
    fn test_streak_reset_when_last_login_in_future() {
        let mut p = Progress::new(UserStats {
            daily_streak: 4,
            longest_streak: 4,
            ..UserStats::default()
        });
        let (change, _) = p.update_streak_on_login(noon() + Duration::days(2), noon());
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(p.stats().daily_streak, 1);
    }

    #[test]
    fn test_streak_same_day_unchanged() {
        let mut p = Progress::new(UserStats {
            daily_streak: 2,
            longest_streak: 5,
            ..UserStats::default()
        });
        let (change, gain) = p.update_streak_on_login(noon() - Duration::hours(5), noon());
        assert_eq!(change, StreakChange::Unchanged);
        assert_eq!(p.stats().daily_streak, 2);
        assert_eq!(gain.amount, LOGIN_XP);
    }

    #[test]
    fn test_first_login_starts_streak() {
        let mut p = Progress::default();
        p.update_streak_on_login(DateTime::<Utc>::UNIX_EPOCH, noon());
        assert_eq!(p.stats().daily_streak, 1);
        assert_eq!(p.stats().longest_streak, 1);
    }

    #[test]
    fn test_awards_and_reset() {
        let mut p = Progress::default();
        p.award_transaction();
        p.award_budget();
        assert_eq!(p.stats().xp, TRANSACTION_XP + BUDGET_XP);
        assert_eq!(p.stats().goals_completed, 1);
        p.reset();
        assert_eq!(*p.stats(), UserStats::default());
    }
}
