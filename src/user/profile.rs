//! User profile: display identity, favorites and preferences.
//!
//! The profile is a per-user singleton stored as one JSON document and
//! validated into this typed shape at the store boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum entries per favorites shelf (characters, games, movies).
pub const MAX_FAVORITES_PER_SHELF: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("too many favorite {shelf} (max {MAX_FAVORITES_PER_SHELF})")]
    TooManyFavorites { shelf: &'static str },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibrarySortOrder {
    #[default]
    RecentlyUpdated,
    Title,
    Rating,
}

/// A name + image pair pinned on one of the favorites shelves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritePick {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoriteShelves {
    pub characters: Vec<FavoritePick>,
    pub games: Vec<FavoritePick>,
    pub movies: Vec<FavoritePick>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub bio: String,
    pub favorites: FavoriteShelves,
    pub theme: ThemePreference,
    pub default_sort: LibrarySortOrder,
    pub notifications_enabled: bool,
    pub public_profile: bool,
}

impl UserProfile {
    /// A profile counts as complete when name, avatar and bio are all set.
    pub fn is_complete(&self) -> bool {
        !self.display_name.trim().is_empty()
            && self.avatar_url.as_deref().is_some_and(|url| !url.is_empty())
            && !self.bio.trim().is_empty()
    }

    /// Enforces the per-shelf favorites cap.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for (shelf, picks) in [
            ("characters", &self.favorites.characters),
            ("games", &self.favorites.games),
            ("movies", &self.favorites.movies),
        ] {
            if picks.len() > MAX_FAVORITES_PER_SHELF {
                return Err(ProfileError::TooManyFavorites { shelf });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> UserProfile {
        UserProfile {
            display_name: "ana".to_string(),
            avatar_url: Some("/media/avatars/abc.png".to_string()),
            bio: "plays everything".to_string(),
            ..UserProfile::default()
        }
    }

    #[test]
    fn completeness_requires_name_avatar_and_bio() {
        assert!(complete_profile().is_complete());
        assert!(!UserProfile::default().is_complete());

        let mut missing_bio = complete_profile();
        missing_bio.bio = "  ".to_string();
        assert!(!missing_bio.is_complete());

        let mut missing_avatar = complete_profile();
        missing_avatar.avatar_url = None;
        assert!(!missing_avatar.is_complete());
    }

    #[test]
    fn validate_caps_favorites() {
        let mut profile = complete_profile();
        profile.favorites.games = (0..4)
            .map(|i| FavoritePick {
                name: format!("game {}", i),
                image_url: None,
            })
            .collect();
        assert_eq!(
            profile.validate(),
            Err(ProfileError::TooManyFavorites { shelf: "games" })
        );

        profile.favorites.games.truncate(3);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn profile_json_defaults_missing_fields() {
        // Stored documents may predate newer fields; serde(default) fills them.
        let profile: UserProfile = serde_json::from_str(r#"{"display_name":"bo"}"#).unwrap();
        assert_eq!(profile.display_name, "bo");
        assert_eq!(profile.theme, ThemePreference::System);
        assert!(!profile.notifications_enabled);
    }
}
