mod catalog;
mod evaluator;

pub use catalog::{
    find_node, AchievementCategory, AchievementNode, AchievementRarity, UnlockRule, CATALOG,
};
pub use evaluator::compute_unlocks;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user unlock record. Title, image and category are denormalized from
/// the catalog at unlock time and never re-read from it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    pub achievement_id: String,
    pub title: String,
    pub image: String,
    pub category: String,
    pub unlocked_at: DateTime<Utc>,
}

impl UserAchievement {
    pub fn unlock_now(node: &AchievementNode) -> Self {
        UserAchievement {
            achievement_id: node.id.to_string(),
            title: node.title.to_string(),
            image: node.image.to_string(),
            category: node.category.as_str().to_string(),
            unlocked_at: Utc::now(),
        }
    }
}
