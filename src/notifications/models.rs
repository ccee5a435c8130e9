//! Notification models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AchievementUnlocked,
    ChallengeCompleted,
    StreakMilestone,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AchievementUnlocked => "achievement_unlocked",
            NotificationKind::ChallengeCompleted => "challenge_completed",
            NotificationKind::StreakMilestone => "streak_milestone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "achievement_unlocked" => Some(NotificationKind::AchievementUnlocked),
            "challenge_completed" => Some(NotificationKind::ChallengeCompleted),
            "streak_milestone" => Some(NotificationKind::StreakMilestone),
            _ => None,
        }
    }
}

/// One delivered notification. `data` carries kind-specific payload for the
/// client (achievement id, challenge id, streak length, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Option<usize>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub data: serde_json::Value,
    /// Unix timestamp of delivery.
    pub created: i64,
}
