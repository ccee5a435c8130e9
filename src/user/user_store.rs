use super::auth::{AuthToken, AuthTokenValue};
use super::profile::UserProfile;
use crate::gamification::UserAchievement;
use crate::notifications::Notification;
use anyhow::Result;

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns a user's authentication token given an AuthTokenValue.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;

    /// Returns all auth tokens of a user.
    fn get_all_user_auth_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>>;

    /// Prunes auth tokens that haven't been used for the specified duration.
    /// Returns the number of tokens that were deleted.
    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize>;
}

pub trait UserStore: UserAuthTokenStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns a user's handle given the user id.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns a user's id given the handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    /// Returns all users' handles.
    fn get_all_user_handles(&self) -> Result<Vec<String>>;

    /// Returns the user's profile document.
    /// Returns Ok(None) if the user never saved one.
    fn get_user_profile(&self, user_id: usize) -> Result<Option<UserProfile>>;

    /// Stores the user's profile document, replacing any previous one.
    fn set_user_profile(&self, user_id: usize, profile: &UserProfile) -> Result<()>;

    /// Returns the user's unlocked achievements, oldest first.
    fn get_user_achievements(&self, user_id: usize) -> Result<Vec<UserAchievement>>;

    /// Records an unlocked achievement. Recording the same achievement id
    /// twice is a no-op (first unlock wins).
    fn add_user_achievement(&self, user_id: usize, achievement: &UserAchievement) -> Result<()>;

    /// Appends a delivered notification and returns it with its assigned id.
    fn append_notification(
        &self,
        user_id: usize,
        notification: &Notification,
    ) -> Result<Notification>;

    /// Returns the user's most recent notifications, newest first.
    fn get_user_notifications(&self, user_id: usize, limit: usize) -> Result<Vec<Notification>>;
}
