//! Achievement unlock evaluation.

use super::catalog::AchievementNode;
use crate::library::{MediaItem, Review};
use crate::user::UserProfile;
use std::collections::HashSet;

/// Runs one evaluation pass over the catalog and returns the nodes that
/// became satisfied, in catalog order.
///
/// A node is considered only if all of its dependencies are unlocked, either
/// before the pass or earlier within the same pass. Evaluation does NOT loop
/// to fixpoint: a chain that becomes satisfiable all at once unlocks in a
/// single pass only because the catalog declares dependencies before their
/// dependents. This mirrors the original product behavior; see DESIGN.md.
pub fn compute_unlocks<'a>(
    catalog: &'a [AchievementNode],
    media_items: &[MediaItem],
    reviews: &[Review],
    profile: Option<&UserProfile>,
    already_unlocked: &HashSet<String>,
) -> Vec<&'a AchievementNode> {
    let mut unlocked_this_pass: Vec<&AchievementNode> = Vec::new();
    let mut working: HashSet<&str> = already_unlocked.iter().map(String::as_str).collect();

    for node in catalog {
        if working.contains(node.id) {
            continue;
        }
        if !node.depends_on.iter().all(|dep| working.contains(dep)) {
            continue;
        }
        if node.rule.matches(media_items, reviews, profile) {
            working.insert(node.id);
            unlocked_this_pass.push(node);
        }
    }

    unlocked_this_pass
}

#[cfg(test)]
mod tests {
    use super::super::catalog::CATALOG;
    use super::*;
    use crate::library::{MediaStatus, MediaType};
    use chrono::Utc;

    fn item(media_type: MediaType, status: MediaStatus, hours: Option<f64>) -> MediaItem {
        let now = Utc::now();
        MediaItem {
            id: uuid::Uuid::new_v4().to_string(),
            title: "x".to_string(),
            media_type,
            status,
            rating: None,
            hours_spent: hours,
            cover_url: None,
            tags: vec![],
            favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn unlocked_ids(
        media_items: &[MediaItem],
        already: &HashSet<String>,
    ) -> Vec<&'static str> {
        compute_unlocks(CATALOG, media_items, &[], None, already)
            .iter()
            .map(|node| node.id)
            .collect()
    }

    #[test]
    fn completed_game_with_hours_unlocks_whole_chain_in_one_pass() {
        let media = vec![item(MediaType::Game, MediaStatus::Completed, Some(120.0))];
        let ids = unlocked_ids(&media, &HashSet::new());

        assert!(ids.contains(&"primeiro_game"));
        assert!(ids.contains(&"completou_primeiro_game"));
        assert!(ids.contains(&"viciado_em_horas"));
        // Only one completed type, so the spread node stays locked.
        assert!(!ids.contains(&"mestre_multimidia"));
    }

    #[test]
    fn dependent_node_stays_locked_without_prerequisite() {
        // A completed game with enough hours, but primeiro_game already
        // filtered out of the working set is impossible here; instead check a
        // node whose predicate holds while its dependency's does not:
        // a 100h game that is still in progress satisfies nothing below it.
        let media = vec![item(MediaType::Game, MediaStatus::InProgress, Some(150.0))];
        let ids = unlocked_ids(&media, &HashSet::new());

        assert!(ids.contains(&"primeiro_game"));
        assert!(!ids.contains(&"completou_primeiro_game"));
        assert!(!ids.contains(&"viciado_em_horas"));
    }

    #[test]
    fn node_with_two_dependencies_needs_both() {
        // cinefilo_completo depends on primeira_sessao AND maratonista.
        let mut media: Vec<MediaItem> = (0..10)
            .map(|_| item(MediaType::Movie, MediaStatus::Completed, None))
            .collect();
        let ids = unlocked_ids(&media, &HashSet::new());
        assert!(ids.contains(&"primeira_sessao"));
        assert!(!ids.contains(&"cinefilo_completo"), "maratonista missing");

        media.extend((0..5).map(|_| item(MediaType::Tv, MediaStatus::Completed, None)));
        let ids = unlocked_ids(&media, &HashSet::new());
        assert!(ids.contains(&"maratonista"));
        assert!(ids.contains(&"cinefilo_completo"));
    }

    #[test]
    fn already_unlocked_nodes_are_not_returned_again() {
        let media = vec![item(MediaType::Game, MediaStatus::Completed, Some(120.0))];
        let already: HashSet<String> = ["primeiro_game", "completou_primeiro_game"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let ids = unlocked_ids(&media, &already);
        assert!(!ids.contains(&"primeiro_game"));
        assert!(!ids.contains(&"completou_primeiro_game"));
        assert!(ids.contains(&"viciado_em_horas"));
    }

    #[test]
    fn profile_rule_reads_the_profile() {
        let profile = UserProfile {
            display_name: "ana".to_string(),
            avatar_url: Some("/media/avatars/a.png".to_string()),
            bio: "oi".to_string(),
            ..UserProfile::default()
        };
        let unlocked = compute_unlocks(CATALOG, &[], &[], Some(&profile), &HashSet::new());
        assert!(unlocked.iter().any(|n| n.id == "identidade_completa"));

        let unlocked = compute_unlocks(CATALOG, &[], &[], None, &HashSet::new());
        assert!(!unlocked.iter().any(|n| n.id == "identidade_completa"));
    }

    #[test]
    fn type_spread_counts_distinct_completed_types() {
        let media = vec![
            item(MediaType::Game, MediaStatus::Completed, None),
            item(MediaType::Book, MediaStatus::Completed, None),
            item(MediaType::Movie, MediaStatus::Completed, None),
            // Planned items do not count toward the spread.
            item(MediaType::Anime, MediaStatus::Planned, None),
        ];
        let ids = unlocked_ids(&media, &HashSet::new());
        assert!(ids.contains(&"mestre_multimidia"));
        assert!(!ids.contains(&"onivoro_cultural"));
    }
}
