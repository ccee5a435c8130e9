//! Weekly challenges.
//!
//! Three difficulty-tiered goals per ISO week, drawn at random from a static
//! template pool whenever the stored week identifier no longer matches the
//! current week. Progress is recomputed from scratch against this week's
//! media items on every update.

use super::local_cache::LocalCache;
use crate::library::{MediaItem, MediaStatus};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

pub const WEEKLY_CACHE_FEATURE: &str = "weekly_challenges";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Items added this week.
    AddItems,
    /// Items completed this week.
    CompleteItems,
    /// Items rated this week, any rating.
    RateItems,
    /// Items rated a straight 10 this week.
    PerfectRatings,
    /// Hours logged across this week's items.
    LogHours,
    /// Current streak length; not week-scoped.
    KeepStreak,
    /// Distinct media types among this week's items.
    ExploreCategories,
}

pub struct ChallengeTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub difficulty: ChallengeDifficulty,
    pub kind: ChallengeKind,
    pub target: f64,
}

pub const CHALLENGE_POOL: &[ChallengeTemplate] = &[
    ChallengeTemplate {
        id: "easy_add_3",
        title: "Estante Crescendo",
        description: "Adicione 3 obras à sua estante esta semana.",
        difficulty: ChallengeDifficulty::Easy,
        kind: ChallengeKind::AddItems,
        target: 3.0,
    },
    ChallengeTemplate {
        id: "easy_complete_1",
        title: "Mais Uma Pra Conta",
        description: "Complete 1 obra esta semana.",
        difficulty: ChallengeDifficulty::Easy,
        kind: ChallengeKind::CompleteItems,
        target: 1.0,
    },
    ChallengeTemplate {
        id: "easy_rate_3",
        title: "Júri Popular",
        description: "Dê nota para 3 obras esta semana.",
        difficulty: ChallengeDifficulty::Easy,
        kind: ChallengeKind::RateItems,
        target: 3.0,
    },
    ChallengeTemplate {
        id: "easy_streak_3",
        title: "Pegando o Ritmo",
        description: "Mantenha uma sequência de 3 dias.",
        difficulty: ChallengeDifficulty::Easy,
        kind: ChallengeKind::KeepStreak,
        target: 3.0,
    },
    ChallengeTemplate {
        id: "medium_complete_3",
        title: "Ritmo Forte",
        description: "Complete 3 obras esta semana.",
        difficulty: ChallengeDifficulty::Medium,
        kind: ChallengeKind::CompleteItems,
        target: 3.0,
    },
    ChallengeTemplate {
        id: "medium_hours_10",
        title: "Dez Horas de Imersão",
        description: "Registre 10 horas esta semana.",
        difficulty: ChallengeDifficulty::Medium,
        kind: ChallengeKind::LogHours,
        target: 10.0,
    },
    ChallengeTemplate {
        id: "medium_categories_3",
        title: "Misturando as Mídias",
        description: "Movimente 3 tipos de mídia diferentes esta semana.",
        difficulty: ChallengeDifficulty::Medium,
        kind: ChallengeKind::ExploreCategories,
        target: 3.0,
    },
    ChallengeTemplate {
        id: "medium_perfect_1",
        title: "Perfeccionista",
        description: "Dê uma nota 10 esta semana.",
        difficulty: ChallengeDifficulty::Medium,
        kind: ChallengeKind::PerfectRatings,
        target: 1.0,
    },
    ChallengeTemplate {
        id: "hard_complete_7",
        title: "Semana Lendária",
        description: "Complete 7 obras esta semana.",
        difficulty: ChallengeDifficulty::Hard,
        kind: ChallengeKind::CompleteItems,
        target: 7.0,
    },
    ChallengeTemplate {
        id: "hard_hours_25",
        title: "Maratona Total",
        description: "Registre 25 horas esta semana.",
        difficulty: ChallengeDifficulty::Hard,
        kind: ChallengeKind::LogHours,
        target: 25.0,
    },
    ChallengeTemplate {
        id: "hard_streak_7",
        title: "Semana Cheia",
        description: "Mantenha uma sequência de 7 dias.",
        difficulty: ChallengeDifficulty::Hard,
        kind: ChallengeKind::KeepStreak,
        target: 7.0,
    },
    ChallengeTemplate {
        id: "hard_categories_5",
        title: "Onívoro da Semana",
        description: "Movimente 5 tipos de mídia diferentes esta semana.",
        difficulty: ChallengeDifficulty::Hard,
        kind: ChallengeKind::ExploreCategories,
        target: 5.0,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: ChallengeDifficulty,
    pub kind: ChallengeKind,
    pub target: f64,
    /// Clamped to `target`, never exceeds it in stored state.
    pub current: f64,
    pub completed: bool,
}

impl Challenge {
    fn from_template(template: &ChallengeTemplate) -> Self {
        Challenge {
            id: template.id.to_string(),
            title: template.title.to_string(),
            description: template.description.to_string(),
            difficulty: template.difficulty,
            kind: template.kind,
            target: template.target,
            current: 0.0,
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChallenges {
    /// `{ISO year}-W{week number}`.
    pub week_id: String,
    pub expires_at: DateTime<Local>,
    pub challenges: Vec<Challenge>,
    pub completed_count: u32,
}

pub fn week_id_for(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Upcoming Sunday 23:59:59.999 local time.
fn end_of_week(date: NaiveDate) -> DateTime<Local> {
    let sunday = monday_of_week(date) + Days::new(6);
    let naive = sunday
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| sunday.and_hms_opt(23, 59, 59).unwrap());
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => Local::now(),
    }
}

fn generate(week_id: String, today: NaiveDate) -> WeeklyChallenges {
    let mut rng = rand::rng();
    let mut challenges = Vec::with_capacity(3);
    for difficulty in [
        ChallengeDifficulty::Easy,
        ChallengeDifficulty::Medium,
        ChallengeDifficulty::Hard,
    ] {
        let tier: Vec<&ChallengeTemplate> = CHALLENGE_POOL
            .iter()
            .filter(|t| t.difficulty == difficulty)
            .collect();
        // The pool always has at least one template per tier.
        if let Some(template) = tier.choose(&mut rng) {
            challenges.push(Challenge::from_template(template));
        }
    }
    WeeklyChallenges {
        week_id,
        expires_at: end_of_week(today),
        challenges,
        completed_count: 0,
    }
}

fn compute_progress(
    kind: ChallengeKind,
    week_items: &[&MediaItem],
    week_start: NaiveDate,
    current_streak: u32,
) -> f64 {
    match kind {
        ChallengeKind::AddItems => week_items
            .iter()
            .filter(|item| item.created_at.with_timezone(&Local).date_naive() >= week_start)
            .count() as f64,
        ChallengeKind::CompleteItems => week_items
            .iter()
            .filter(|item| item.status == MediaStatus::Completed)
            .count() as f64,
        ChallengeKind::RateItems => week_items
            .iter()
            .filter(|item| item.rating.is_some())
            .count() as f64,
        ChallengeKind::PerfectRatings => week_items
            .iter()
            .filter(|item| item.rating == Some(10))
            .count() as f64,
        ChallengeKind::LogHours => week_items.iter().filter_map(|item| item.hours_spent).sum(),
        ChallengeKind::KeepStreak => current_streak as f64,
        ChallengeKind::ExploreCategories => week_items
            .iter()
            .map(|item| item.media_type)
            .collect::<HashSet<_>>()
            .len() as f64,
    }
}

pub struct WeeklyChallengeGenerator {
    cache: Arc<LocalCache>,
}

impl WeeklyChallengeGenerator {
    pub fn new(cache: Arc<LocalCache>) -> Self {
        Self { cache }
    }

    /// Returns the stored set for the current week, generating a fresh one
    /// when none exists or the stored week identifier is stale.
    pub fn get_or_create(&self, user_id: usize) -> WeeklyChallenges {
        self.get_or_create_on(user_id, Local::now().date_naive())
    }

    pub(crate) fn get_or_create_on(&self, user_id: usize, today: NaiveDate) -> WeeklyChallenges {
        let week_id = week_id_for(today);
        if let Some(stored) = self
            .cache
            .get::<WeeklyChallenges>(WEEKLY_CACHE_FEATURE, user_id)
        {
            if stored.week_id == week_id {
                return stored;
            }
        }

        let fresh = generate(week_id, today);
        if let Err(e) = self.cache.put(WEEKLY_CACHE_FEATURE, user_id, &fresh) {
            warn!(
                "Failed to persist weekly challenges for user {}: {}",
                user_id, e
            );
        }
        fresh
    }

    /// Recomputes progress against this week's media items (`updated_at` on
    /// or after Monday 00:00 local). Streak challenges read the supplied
    /// streak directly.
    pub fn update_progress(
        &self,
        user_id: usize,
        media_items: &[MediaItem],
        current_streak: u32,
    ) -> WeeklyChallenges {
        self.update_progress_on(user_id, media_items, current_streak, Local::now().date_naive())
    }

    pub(crate) fn update_progress_on(
        &self,
        user_id: usize,
        media_items: &[MediaItem],
        current_streak: u32,
        today: NaiveDate,
    ) -> WeeklyChallenges {
        let mut state = self.get_or_create_on(user_id, today);
        let week_start = monday_of_week(today);

        let week_items: Vec<&MediaItem> = media_items
            .iter()
            .filter(|item| item.updated_at.with_timezone(&Local).date_naive() >= week_start)
            .collect();

        for challenge in &mut state.challenges {
            let raw = compute_progress(challenge.kind, &week_items, week_start, current_streak);
            challenge.completed = raw >= challenge.target;
            challenge.current = raw.min(challenge.target);
        }
        state.completed_count = state.challenges.iter().filter(|c| c.completed).count() as u32;

        if let Err(e) = self.cache.put(WEEKLY_CACHE_FEATURE, user_id, &state) {
            warn!(
                "Failed to persist weekly challenge progress for user {}: {}",
                user_id, e
            );
        }
        state
    }
}
