//! Gamification rule engine: achievements, streaks, weekly challenges and
//! recommendations.
//!
//! All components recompute from the user's freshly-read collections on every
//! call; there is no incremental state beyond the per-user local cache used
//! by the streak tracker and the weekly challenge generator. Evaluations for
//! the same user are not coordinated against each other; the app assumes a
//! single active session per user.

mod achievements;
mod local_cache;
mod recommendations;
mod streak;
mod weekly;

pub use achievements::{
    compute_unlocks, find_node, AchievementCategory, AchievementNode, AchievementRarity,
    UnlockRule, UserAchievement, CATALOG,
};
pub use local_cache::LocalCache;
pub use recommendations::{score, Recommendation, RecommendationSource, MAX_RECOMMENDATIONS};
pub use streak::{StreakData, StreakHistoryEntry, StreakTracker, STREAK_HISTORY_LIMIT};
pub use weekly::{
    week_id_for, Challenge, ChallengeDifficulty, ChallengeKind, ChallengeTemplate,
    WeeklyChallengeGenerator, WeeklyChallenges, CHALLENGE_POOL,
};

use crate::library::LibraryStore;
use crate::notifications::{Notification, NotificationDispatcher, NotificationKind};
use crate::user::UserStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Streak lengths worth celebrating with a notification.
const STREAK_MILESTONES: &[u32] = &[3, 7, 14, 30, 60, 100, 365];

/// One catalog node plus the user's unlock state, for the achievement tree.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementOverview {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub category: AchievementCategory,
    pub rarity: AchievementRarity,
    pub depends_on: &'static [&'static str],
    pub position: (u8, u8),
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakStatus {
    #[serde(flatten)]
    pub data: StreakData,
    /// True iff the last visit was exactly yesterday and today's is missing.
    pub at_risk: bool,
}

pub struct GamificationService {
    library_store: Arc<dyn LibraryStore>,
    user_store: Arc<dyn UserStore>,
    streaks: StreakTracker,
    weekly: WeeklyChallengeGenerator,
    dispatcher: Arc<NotificationDispatcher>,
}

impl GamificationService {
    pub fn new(
        library_store: Arc<dyn LibraryStore>,
        user_store: Arc<dyn UserStore>,
        cache: Arc<LocalCache>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            library_store,
            user_store,
            streaks: StreakTracker::new(cache.clone()),
            weekly: WeeklyChallengeGenerator::new(cache),
            dispatcher,
        }
    }

    fn media_items(&self, user_id: usize) -> Vec<crate::library::MediaItem> {
        self.library_store.get_media_items(user_id).unwrap_or_else(|e| {
            warn!("Failed to read media items for user {}: {}", user_id, e);
            Vec::new()
        })
    }

    /// Runs one achievement evaluation pass and persists new unlocks.
    ///
    /// Unlock writes are sequential, one per node, unbatched; a failed write
    /// is logged and does not block later nodes (the next pass re-reads the
    /// unlocked set and heals the gap). The returned records are what the
    /// client animates.
    pub fn evaluate_achievements(&self, user_id: usize) -> Vec<UserAchievement> {
        let media_items = self.media_items(user_id);
        let reviews = self.library_store.get_reviews(user_id).unwrap_or_else(|e| {
            warn!("Failed to read reviews for user {}: {}", user_id, e);
            Vec::new()
        });
        let profile = self
            .user_store
            .get_user_profile(user_id)
            .unwrap_or_else(|e| {
                warn!("Failed to read profile for user {}: {}", user_id, e);
                None
            });
        let already: HashSet<String> = self
            .user_store
            .get_user_achievements(user_id)
            .unwrap_or_else(|e| {
                warn!("Failed to read achievements for user {}: {}", user_id, e);
                Vec::new()
            })
            .into_iter()
            .map(|a| a.achievement_id)
            .collect();

        let nodes = compute_unlocks(CATALOG, &media_items, &reviews, profile.as_ref(), &already);

        let mut unlocked = Vec::with_capacity(nodes.len());
        for node in nodes {
            let record = UserAchievement::unlock_now(node);
            if let Err(e) = self.user_store.add_user_achievement(user_id, &record) {
                warn!(
                    "Failed to persist achievement {} for user {}: {}",
                    node.id, user_id, e
                );
            }
            self.dispatcher.enqueue(
                user_id,
                Notification {
                    id: None,
                    kind: NotificationKind::AchievementUnlocked,
                    title: format!("Conquista desbloqueada: {}", node.title),
                    body: Some(node.description.to_string()),
                    data: serde_json::json!({
                        "achievement_id": node.id,
                        "image": node.image,
                        "category": node.category.as_str(),
                    }),
                    created: Utc::now().timestamp(),
                },
            );
            unlocked.push(record);
        }
        unlocked
    }

    /// The full catalog annotated with the user's unlock timestamps.
    pub fn achievement_overview(&self, user_id: usize) -> Vec<AchievementOverview> {
        let unlocked = self
            .user_store
            .get_user_achievements(user_id)
            .unwrap_or_else(|e| {
                warn!("Failed to read achievements for user {}: {}", user_id, e);
                Vec::new()
            });

        CATALOG
            .iter()
            .map(|node| AchievementOverview {
                id: node.id,
                title: node.title,
                description: node.description,
                image: node.image,
                category: node.category,
                rarity: node.rarity,
                depends_on: node.depends_on,
                position: node.position,
                unlocked_at: unlocked
                    .iter()
                    .find(|a| a.achievement_id == node.id)
                    .map(|a| a.unlocked_at),
            })
            .collect()
    }

    /// Registers today's visit, celebrating round streak numbers.
    pub fn touch_streak(&self, user_id: usize) -> StreakData {
        let before = self.streaks.get(user_id).current_streak;
        let data = self.streaks.touch(user_id);

        if data.current_streak > before && STREAK_MILESTONES.contains(&data.current_streak) {
            self.dispatcher.enqueue(
                user_id,
                Notification {
                    id: None,
                    kind: NotificationKind::StreakMilestone,
                    title: format!("{} dias seguidos!", data.current_streak),
                    body: None,
                    data: serde_json::json!({ "streak": data.current_streak }),
                    created: Utc::now().timestamp(),
                },
            );
        }
        data
    }

    pub fn streak_status(&self, user_id: usize) -> StreakStatus {
        StreakStatus {
            data: self.streaks.get(user_id),
            at_risk: self.streaks.is_at_risk(user_id),
        }
    }

    pub fn weekly_challenges(&self, user_id: usize) -> WeeklyChallenges {
        self.weekly.get_or_create(user_id)
    }

    /// Recomputes weekly progress against the user's current library.
    pub fn refresh_weekly_progress(&self, user_id: usize) -> WeeklyChallenges {
        let media_items = self.media_items(user_id);
        let current_streak = self.streaks.get(user_id).current_streak;

        let before: HashSet<String> = self
            .weekly
            .get_or_create(user_id)
            .challenges
            .iter()
            .filter(|c| c.completed)
            .map(|c| c.id.clone())
            .collect();

        let updated = self
            .weekly
            .update_progress(user_id, &media_items, current_streak);

        for challenge in updated.challenges.iter().filter(|c| c.completed) {
            if !before.contains(&challenge.id) {
                self.dispatcher.enqueue(
                    user_id,
                    Notification {
                        id: None,
                        kind: NotificationKind::ChallengeCompleted,
                        title: format!("Desafio concluído: {}", challenge.title),
                        body: None,
                        data: serde_json::json!({ "challenge_id": challenge.id }),
                        created: Utc::now().timestamp(),
                    },
                );
            }
        }
        updated
    }

    pub fn recommendations(&self, user_id: usize) -> Vec<Recommendation> {
        score(&self.media_items(user_id))
    }

    pub fn notifications(&self, user_id: usize, limit: usize) -> Vec<Notification> {
        self.user_store
            .get_user_notifications(user_id, limit)
            .unwrap_or_else(|e| {
                warn!("Failed to read notifications for user {}: {}", user_id, e);
                Vec::new()
            })
    }
}
