use crate::model::UserStats;
use crate::sync::{Collection, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The profile of an authenticated user.
///
/// Created at registration and loaded at login. The in-memory copy is discarded at logout while the
/// stored copy survives.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_login: DateTime<Utc>,
    #[serde(default)]
    pub(crate) points: u64,
    #[serde(default)]
    pub(crate) streak_count: u32,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            created_at: now,
            last_login: now,
            points: 0,
            streak_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_login(&self) -> DateTime<Utc> {
        self.last_login
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn streak_count(&self) -> u32 {
        self.streak_count
    }

    /// Copies the streak and XP totals from `stats` into the profile.
    pub(crate) fn mirror_stats(&mut self, stats: &UserStats) {
        self.points = stats.total_xp();
        self.streak_count = stats.daily_streak;
    }
}

impl Record for User {
    const COLLECTION: Collection = Collection::Profile;
    const SCHEMA_VERSION: u32 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_stats() {
        let mut user = User::new("u1", "ann@example.com", Utc::now());
        let stats = UserStats {
            level: 2,
            xp: 5,
            xp_to_next_level: 150,
            daily_streak: 3,
            ..UserStats::default()
        };
        user.mirror_stats(&stats);
        assert_eq!(user.points(), 105);
        assert_eq!(user.streak_count(), 3);
        assert_eq!(user.last_login(), user.created_at());
    }
}
