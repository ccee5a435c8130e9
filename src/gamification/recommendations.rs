//! Recommendation scoring.
//!
//! Five fixed heuristics each contribute scored candidates; the union is
//! sorted by score and truncated. Pure computation over the in-memory
//! library, no persistence. Duplicates across heuristics are not guarded
//! against: the status filters are disjoint, an item matches at most one.

use crate::library::{MediaItem, MediaStatus, MediaType};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const MAX_RECOMMENDATIONS: usize = 8;

/// Days within which a completed item counts as trending.
const TRENDING_WINDOW_DAYS: i64 = 7;

/// Days after which a planned item counts as forgotten backlog.
const HIDDEN_BACKLOG_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Continue,
    Similar,
    Abandoned,
    Trending,
    Hidden,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub media_id: String,
    pub title: String,
    pub media_type: MediaType,
    pub cover_url: Option<String>,
    pub score: u32,
    pub reason: String,
    pub source: RecommendationSource,
}

fn recommend(item: &MediaItem, score: u32, reason: String, source: RecommendationSource) -> Recommendation {
    Recommendation {
        media_id: item.id.clone(),
        title: item.title.clone(),
        media_type: item.media_type,
        cover_url: item.cover_url.clone(),
        score,
        reason,
        source,
    }
}

/// Most common type among highly-rated items, if any.
fn favorite_type(items: &[MediaItem]) -> Option<MediaType> {
    let mut counts: HashMap<MediaType, usize> = HashMap::new();
    for item in items.iter().filter(|i| i.rating.is_some_and(|r| r >= 8)) {
        *counts.entry(item.media_type).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(media_type, _)| media_type)
}

pub fn score(items: &[MediaItem]) -> Vec<Recommendation> {
    score_at(items, Utc::now())
}

pub(crate) fn score_at(items: &[MediaItem], now: DateTime<Utc>) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = Vec::new();

    // Continue where you left off: freshest in-progress items.
    let mut in_progress: Vec<&MediaItem> = items
        .iter()
        .filter(|i| i.status == MediaStatus::InProgress)
        .collect();
    in_progress.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    out.extend(in_progress.iter().take(3).map(|item| {
        recommend(
            item,
            100,
            "Continue de onde parou".to_string(),
            RecommendationSource::Continue,
        )
    }));

    // More of what the user loves: planned items of the favorite type.
    if let Some(loved_type) = favorite_type(items) {
        let mut planned: Vec<&MediaItem> = items
            .iter()
            .filter(|i| i.status == MediaStatus::Planned && i.media_type == loved_type)
            .collect();
        planned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        out.extend(planned.iter().take(2).map(|item| {
            recommend(
                item,
                90,
                format!("Você amou outros {}", loved_type.as_str()),
                RecommendationSource::Similar,
            )
        }));
    }

    // Dropped but well rated: worth a second chance.
    let mut abandoned: Vec<&MediaItem> = items
        .iter()
        .filter(|i| i.status == MediaStatus::Dropped && i.rating.is_some_and(|r| r >= 7))
        .collect();
    abandoned.sort_by(|a, b| b.rating.cmp(&a.rating));
    out.extend(abandoned.iter().take(2).map(|item| {
        recommend(
            item,
            80,
            format!(
                "Você deu nota {}/10, vale retomar",
                item.rating.unwrap_or(0)
            ),
            RecommendationSource::Abandoned,
        )
    }));

    // Fresh wins: completed within the last week.
    let trending_cutoff = now - Duration::days(TRENDING_WINDOW_DAYS);
    let mut trending: Vec<&MediaItem> = items
        .iter()
        .filter(|i| i.status == MediaStatus::Completed && i.updated_at >= trending_cutoff)
        .collect();
    trending.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    out.extend(trending.iter().take(2).map(|item| {
        recommend(
            item,
            70,
            "Concluído recentemente".to_string(),
            RecommendationSource::Trending,
        )
    }));

    // Forgotten backlog: planned long ago and untouched since, oldest first.
    let hidden_cutoff = now - Duration::days(HIDDEN_BACKLOG_DAYS);
    let mut hidden: Vec<&MediaItem> = items
        .iter()
        .filter(|i| i.status == MediaStatus::Planned && i.updated_at < hidden_cutoff)
        .collect();
    hidden.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
    out.extend(hidden.iter().take(2).map(|item| {
        let days = (now - item.created_at).num_days();
        recommend(
            item,
            60,
            format!("Adicionado há {} dias, que tal começar?", days),
            RecommendationSource::Hidden,
        )
    }));

    out.sort_by(|a, b| b.score.cmp(&a.score));
    out.truncate(MAX_RECOMMENDATIONS);
    out
}
