//! Library data models: media items, reviews and milestones.

use crate::richtext::RichText;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored row does not decode into a typed record. Stores
/// validate at this boundary instead of passing loose shapes upward.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unknown {field} value: {value}")]
    UnknownVariant { field: &'static str, value: String },
    #[error("malformed {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Game,
    Movie,
    Tv,
    Book,
    Anime,
    Manga,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Game => "game",
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Book => "book",
            MediaType::Anime => "anime",
            MediaType::Manga => "manga",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "game" => Some(MediaType::Game),
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            "book" => Some(MediaType::Book),
            "anime" => Some(MediaType::Anime),
            "manga" => Some(MediaType::Manga),
            _ => None,
        }
    }

    /// Types whose `hours_spent` field is displayed as pages.
    pub fn counts_pages(&self) -> bool {
        matches!(self, MediaType::Book | MediaType::Manga)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaStatus {
    Completed,
    InProgress,
    Dropped,
    Planned,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Completed => "completed",
            MediaStatus::InProgress => "in-progress",
            MediaStatus::Dropped => "dropped",
            MediaStatus::Planned => "planned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(MediaStatus::Completed),
            "in-progress" => Some(MediaStatus::InProgress),
            "dropped" => Some(MediaStatus::Dropped),
            "planned" => Some(MediaStatus::Planned),
            _ => None,
        }
    }
}

/// One catalogued work, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub media_type: MediaType,
    pub status: MediaStatus,
    pub rating: Option<u8>,
    pub hours_spent: Option<f64>,
    pub cover_url: Option<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a media item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMediaItem {
    pub title: String,
    pub media_type: MediaType,
    pub status: MediaStatus,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub hours_spent: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
}

/// Partial update; absent fields are left untouched, explicit nulls clear
/// optional fields. `updated_at` is always refreshed on any edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaItemUpdate {
    pub title: Option<String>,
    pub media_type: Option<MediaType>,
    pub status: Option<MediaStatus>,
    #[serde(deserialize_with = "double_option")]
    pub rating: Option<Option<u8>>,
    #[serde(deserialize_with = "double_option")]
    pub hours_spent: Option<Option<f64>>,
    #[serde(deserialize_with = "double_option")]
    pub cover_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub favorite: Option<bool>,
}

/// Distinguishes an absent field (outer None, leave unchanged) from an
/// explicit null (Some(None), clear the value).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Free-text opinion tied to one media item. The referenced item may have
/// been deleted; a dangling `media_id` is tolerated and simply fails to
/// resolve in display joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub media_id: String,
    pub title: String,
    pub content: RichText,
    pub rating: u8,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub media_id: String,
    pub title: String,
    pub content: RichText,
    pub rating: u8,
    pub favorite: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub title: Option<String>,
    pub content: Option<RichText>,
    pub rating: Option<u8>,
    pub favorite: Option<bool>,
}

/// A review joined with the title of the media item it references, when that
/// item still exists.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedReview {
    #[serde(flatten)]
    pub review: Review,
    pub media_title: Option<String>,
}

/// Maximum number of images attachable to a milestone.
pub const MILESTONE_MAX_IMAGES: usize = 2;

/// A personal-journey log entry, independent of any media item's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub description: RichText,
    pub icon: String,
    pub date: NaiveDate,
    pub media_id: Option<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub title: String,
    pub description: RichText,
    pub icon: String,
    pub date: NaiveDate,
    pub media_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MilestoneUpdate {
    pub title: Option<String>,
    pub description: Option<RichText>,
    pub icon: Option<String>,
    pub date: Option<NaiveDate>,
    pub media_id: Option<Option<String>>,
}

pub(crate) fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RecordError::Malformed {
            field,
            reason: e.to_string(),
        })
}
