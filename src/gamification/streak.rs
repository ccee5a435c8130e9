//! Consecutive-day streak tracking.
//!
//! Day difference is computed by calendar-date subtraction at local-timezone
//! day granularity, not elapsed hours: a visit at 23:59 followed by one at
//! 00:01 the next day counts as consecutive days. This is a product decision
//! carried over from the original app, not an accident.

use super::local_cache::LocalCache;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub const STREAK_CACHE_FEATURE: &str = "streak";

/// Bounded ring of daily entries kept for the history chart.
pub const STREAK_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakHistoryEntry {
    pub date: NaiveDate,
    pub streak_count: u32,
    /// True when this entry restarted the streak after a gap.
    pub broken: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakData {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_access_date: Option<NaiveDate>,
    pub total_days: u32,
    pub streak_history: Vec<StreakHistoryEntry>,
}

/// Applies one touch to the streak state machine. Returns the new state and
/// whether anything changed (at most one mutation per calendar day).
fn advance(mut data: StreakData, today: NaiveDate) -> (StreakData, bool) {
    let day_diff = match data.last_access_date {
        None => {
            data.current_streak = 1;
            data.longest_streak = data.longest_streak.max(1);
            data.total_days = 1;
            data.last_access_date = Some(today);
            data.streak_history.push(StreakHistoryEntry {
                date: today,
                streak_count: 1,
                broken: false,
            });
            return (data, true);
        }
        Some(last) => (today - last).num_days(),
    };

    // Same day, or a clock that moved backwards: already touched.
    if day_diff <= 0 {
        return (data, false);
    }

    if day_diff == 1 {
        data.current_streak += 1;
        data.longest_streak = data.longest_streak.max(data.current_streak);
        data.streak_history.push(StreakHistoryEntry {
            date: today,
            streak_count: data.current_streak,
            broken: false,
        });
    } else {
        data.current_streak = 1;
        data.streak_history.push(StreakHistoryEntry {
            date: today,
            streak_count: 1,
            broken: true,
        });
    }

    data.total_days += 1;
    data.last_access_date = Some(today);
    if data.streak_history.len() > STREAK_HISTORY_LIMIT {
        let excess = data.streak_history.len() - STREAK_HISTORY_LIMIT;
        data.streak_history.drain(..excess);
    }
    (data, true)
}

pub struct StreakTracker {
    cache: Arc<LocalCache>,
}

impl StreakTracker {
    pub fn new(cache: Arc<LocalCache>) -> Self {
        Self { cache }
    }

    /// Registers today's visit, called once per session/page load. Idempotent
    /// within a calendar day.
    pub fn touch(&self, user_id: usize) -> StreakData {
        self.touch_on(user_id, Local::now().date_naive())
    }

    pub(crate) fn touch_on(&self, user_id: usize, today: NaiveDate) -> StreakData {
        let stored = self
            .cache
            .get::<StreakData>(STREAK_CACHE_FEATURE, user_id)
            .unwrap_or_default();

        let (data, changed) = advance(stored, today);
        if changed {
            if let Err(e) = self.cache.put(STREAK_CACHE_FEATURE, user_id, &data) {
                warn!("Failed to persist streak for user {}: {}", user_id, e);
            }
        }
        data
    }

    /// Current state without registering a visit.
    pub fn get(&self, user_id: usize) -> StreakData {
        self.cache
            .get::<StreakData>(STREAK_CACHE_FEATURE, user_id)
            .unwrap_or_default()
    }

    /// True iff the last visit was exactly yesterday: the streak breaks
    /// unless the user shows up today. Read-only, never mutates state.
    pub fn is_at_risk(&self, user_id: usize) -> bool {
        self.is_at_risk_on(user_id, Local::now().date_naive())
    }

    pub(crate) fn is_at_risk_on(&self, user_id: usize, today: NaiveDate) -> bool {
        self.get(user_id)
            .last_access_date
            .is_some_and(|last| (today - last).num_days() == 1)
    }
}
