use super::models::{
    MediaItem, MediaItemUpdate, Milestone, MilestoneUpdate, NewMediaItem, NewMilestone, NewReview,
    Review, ReviewUpdate,
};
use anyhow::Result;

/// Storage for a user's library collections (media items, reviews,
/// milestones). All collections are owned per user; an id from one user is
/// never visible to another.
pub trait LibraryStore: Send + Sync {
    /// Creates a media item and returns the stored record.
    fn add_media_item(&self, user_id: usize, item: NewMediaItem) -> Result<MediaItem>;

    /// Returns a single media item.
    /// Returns Ok(None) if the item does not exist or belongs to another user.
    fn get_media_item(&self, user_id: usize, item_id: &str) -> Result<Option<MediaItem>>;

    /// Returns all of the user's media items, most recently updated first.
    fn get_media_items(&self, user_id: usize) -> Result<Vec<MediaItem>>;

    /// Applies a partial update, refreshing `updated_at`.
    /// Returns Ok(None) if the item does not exist.
    fn update_media_item(
        &self,
        user_id: usize,
        item_id: &str,
        update: MediaItemUpdate,
    ) -> Result<Option<MediaItem>>;

    /// Deletes a media item, returning the deleted record so the caller can
    /// cascade cover-image deletion. Returns Ok(None) if it did not exist.
    fn delete_media_item(&self, user_id: usize, item_id: &str) -> Result<Option<MediaItem>>;

    fn add_review(&self, user_id: usize, review: NewReview) -> Result<Review>;

    fn get_review(&self, user_id: usize, review_id: &str) -> Result<Option<Review>>;

    /// Returns all of the user's reviews, most recently updated first.
    fn get_reviews(&self, user_id: usize) -> Result<Vec<Review>>;

    fn update_review(
        &self,
        user_id: usize,
        review_id: &str,
        update: ReviewUpdate,
    ) -> Result<Option<Review>>;

    fn delete_review(&self, user_id: usize, review_id: &str) -> Result<Option<Review>>;

    fn add_milestone(&self, user_id: usize, milestone: NewMilestone) -> Result<Milestone>;

    /// Returns all of the user's milestones, newest date first.
    fn get_milestones(&self, user_id: usize) -> Result<Vec<Milestone>>;

    fn update_milestone(
        &self,
        user_id: usize,
        milestone_id: &str,
        update: MilestoneUpdate,
    ) -> Result<Option<Milestone>>;

    /// Replaces the milestone's attached image list.
    /// Returns Ok(None) if the milestone does not exist.
    fn set_milestone_images(
        &self,
        user_id: usize,
        milestone_id: &str,
        images: Vec<String>,
    ) -> Result<Option<Milestone>>;

    fn delete_milestone(&self, user_id: usize, milestone_id: &str) -> Result<Option<Milestone>>;
}
