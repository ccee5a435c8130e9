use super::models::{
    parse_timestamp, MediaItem, MediaItemUpdate, MediaStatus, MediaType, Milestone,
    MilestoneUpdate, NewMediaItem, NewMilestone, NewReview, RecordError, Review, ReviewUpdate,
};
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::store::LibraryStore;
use crate::richtext::RichText;
use crate::sqlite_persistence::apply_versioned_schemas;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

/// Raw row shapes. Rows are decoded into typed records outside the rusqlite
/// closure so that a malformed stored value surfaces as a [`RecordError`]
/// instead of a loose shape.
struct MediaItemRow {
    id: String,
    title: String,
    media_type: String,
    status: String,
    rating: Option<i64>,
    hours_spent: Option<f64>,
    cover_url: Option<String>,
    tags: String,
    favorite: bool,
    created_at: String,
    updated_at: String,
}

impl MediaItemRow {
    const COLUMNS: &'static str = "id, title, media_type, status, rating, hours_spent, \
                                   cover_url, tags, favorite, created_at, updated_at";

    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(MediaItemRow {
            id: row.get(0)?,
            title: row.get(1)?,
            media_type: row.get(2)?,
            status: row.get(3)?,
            rating: row.get(4)?,
            hours_spent: row.get(5)?,
            cover_url: row.get(6)?,
            tags: row.get(7)?,
            favorite: row.get::<_, i64>(8)? != 0,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn decode(self) -> Result<MediaItem, RecordError> {
        let media_type =
            MediaType::from_str(&self.media_type).ok_or_else(|| RecordError::UnknownVariant {
                field: "media_type",
                value: self.media_type.clone(),
            })?;
        let status =
            MediaStatus::from_str(&self.status).ok_or_else(|| RecordError::UnknownVariant {
                field: "status",
                value: self.status.clone(),
            })?;
        let tags: Vec<String> =
            serde_json::from_str(&self.tags).map_err(|e| RecordError::Malformed {
                field: "tags",
                reason: e.to_string(),
            })?;
        Ok(MediaItem {
            id: self.id,
            title: self.title,
            media_type,
            status,
            rating: self.rating.map(|r| r as u8),
            hours_spent: self.hours_spent,
            cover_url: self.cover_url,
            tags,
            favorite: self.favorite,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

struct ReviewRow {
    id: String,
    media_id: String,
    title: String,
    content: String,
    rating: i64,
    favorite: bool,
    created_at: String,
    updated_at: String,
}

impl ReviewRow {
    const COLUMNS: &'static str =
        "id, media_id, title, content, rating, favorite, created_at, updated_at";

    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(ReviewRow {
            id: row.get(0)?,
            media_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            rating: row.get(4)?,
            favorite: row.get::<_, i64>(5)? != 0,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<Review, RecordError> {
        let content =
            RichText::from_stored_json(&self.content).map_err(|e| RecordError::Malformed {
                field: "content",
                reason: e.to_string(),
            })?;
        Ok(Review {
            id: self.id,
            media_id: self.media_id,
            title: self.title,
            content,
            rating: self.rating as u8,
            favorite: self.favorite,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

struct MilestoneRow {
    id: String,
    title: String,
    description: String,
    icon: String,
    date: String,
    media_id: Option<String>,
    images: String,
    created_at: String,
    updated_at: String,
}

impl MilestoneRow {
    const COLUMNS: &'static str =
        "id, title, description, icon, date, media_id, images, created_at, updated_at";

    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(MilestoneRow {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            icon: row.get(3)?,
            date: row.get(4)?,
            media_id: row.get(5)?,
            images: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<Milestone, RecordError> {
        let description =
            RichText::from_stored_json(&self.description).map_err(|e| RecordError::Malformed {
                field: "description",
                reason: e.to_string(),
            })?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|e| {
            RecordError::Malformed {
                field: "date",
                reason: e.to_string(),
            }
        })?;
        let images: Vec<String> =
            serde_json::from_str(&self.images).map_err(|e| RecordError::Malformed {
                field: "images",
                reason: e.to_string(),
            })?;
        Ok(Milestone {
            id: self.id,
            title: self.title,
            description,
            icon: self.icon,
            date,
            media_id: self.media_id,
            images,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_file_path: P) -> Result<Self> {
        let conn = Connection::open(db_file_path.as_ref())
            .with_context(|| format!("Failed to open library db {:?}", db_file_path.as_ref()))?;
        let applied = apply_versioned_schemas(&conn, LIBRARY_VERSIONED_SCHEMAS)?;
        if applied > 0 {
            info!("Applied {} library schema version(s)", applied);
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn write_media_item(conn: &Connection, user_id: usize, item: &MediaItem) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO media_item \
             (id, user_id, title, media_type, status, rating, hours_spent, cover_url, tags, \
              favorite, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                item.id,
                user_id,
                item.title,
                item.media_type.as_str(),
                item.status.as_str(),
                item.rating.map(|r| r as i64),
                item.hours_spent,
                item.cover_url,
                serde_json::to_string(&item.tags)?,
                item.favorite as i64,
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn write_review(conn: &Connection, user_id: usize, review: &Review) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO review \
             (id, user_id, media_id, title, content, rating, favorite, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                review.id,
                user_id,
                review.media_id,
                review.title,
                review.content.to_stored_json(),
                review.rating as i64,
                review.favorite as i64,
                review.created_at.to_rfc3339(),
                review.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn write_milestone(conn: &Connection, user_id: usize, milestone: &Milestone) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO milestone \
             (id, user_id, title, description, icon, date, media_id, images, created_at, \
              updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                milestone.id,
                user_id,
                milestone.title,
                milestone.description.to_stored_json(),
                milestone.icon,
                milestone.date.format("%Y-%m-%d").to_string(),
                milestone.media_id,
                serde_json::to_string(&milestone.images)?,
                milestone.created_at.to_rfc3339(),
                milestone.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_milestone(&self, user_id: usize, milestone_id: &str) -> Result<Option<Milestone>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM milestone WHERE id = ?1 AND user_id = ?2",
                    MilestoneRow::COLUMNS
                ),
                params![milestone_id, user_id],
                MilestoneRow::read,
            )
            .optional()?;
        match row {
            Some(row) => Ok(Some(row.decode()?)),
            None => Ok(None),
        }
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn add_media_item(&self, user_id: usize, item: NewMediaItem) -> Result<MediaItem> {
        let now = Utc::now();
        let stored = MediaItem {
            id: Uuid::new_v4().to_string(),
            title: item.title,
            media_type: item.media_type,
            status: item.status,
            rating: item.rating,
            hours_spent: item.hours_spent,
            cover_url: None,
            tags: item.tags,
            favorite: item.favorite,
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn.lock().unwrap();
        Self::write_media_item(&conn, user_id, &stored)?;
        Ok(stored)
    }

    fn get_media_item(&self, user_id: usize, item_id: &str) -> Result<Option<MediaItem>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM media_item WHERE id = ?1 AND user_id = ?2",
                    MediaItemRow::COLUMNS
                ),
                params![item_id, user_id],
                MediaItemRow::read,
            )
            .optional()?;
        match row {
            Some(row) => Ok(Some(row.decode()?)),
            None => Ok(None),
        }
    }

    fn get_media_items(&self, user_id: usize) -> Result<Vec<MediaItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM media_item WHERE user_id = ?1",
            MediaItemRow::COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id], MediaItemRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        let mut items = rows
            .into_iter()
            .map(|row| row.decode().map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?;
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    fn update_media_item(
        &self,
        user_id: usize,
        item_id: &str,
        update: MediaItemUpdate,
    ) -> Result<Option<MediaItem>> {
        let mut item = match self.get_media_item(user_id, item_id)? {
            Some(item) => item,
            None => return Ok(None),
        };

        if let Some(title) = update.title {
            item.title = title;
        }
        if let Some(media_type) = update.media_type {
            item.media_type = media_type;
        }
        if let Some(status) = update.status {
            item.status = status;
        }
        if let Some(rating) = update.rating {
            item.rating = rating;
        }
        if let Some(hours_spent) = update.hours_spent {
            item.hours_spent = hours_spent;
        }
        if let Some(cover_url) = update.cover_url {
            item.cover_url = cover_url;
        }
        if let Some(tags) = update.tags {
            item.tags = tags;
        }
        if let Some(favorite) = update.favorite {
            item.favorite = favorite;
        }
        item.updated_at = Utc::now();

        let conn = self.conn.lock().unwrap();
        Self::write_media_item(&conn, user_id, &item)?;
        Ok(Some(item))
    }

    fn delete_media_item(&self, user_id: usize, item_id: &str) -> Result<Option<MediaItem>> {
        let item = match self.get_media_item(user_id, item_id)? {
            Some(item) => item,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM media_item WHERE id = ?1 AND user_id = ?2",
            params![item_id, user_id],
        )?;
        Ok(Some(item))
    }

    fn add_review(&self, user_id: usize, review: NewReview) -> Result<Review> {
        let now = Utc::now();
        let stored = Review {
            id: Uuid::new_v4().to_string(),
            media_id: review.media_id,
            title: review.title,
            content: review.content,
            rating: review.rating,
            favorite: review.favorite,
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn.lock().unwrap();
        Self::write_review(&conn, user_id, &stored)?;
        Ok(stored)
    }

    fn get_review(&self, user_id: usize, review_id: &str) -> Result<Option<Review>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM review WHERE id = ?1 AND user_id = ?2",
                    ReviewRow::COLUMNS
                ),
                params![review_id, user_id],
                ReviewRow::read,
            )
            .optional()?;
        match row {
            Some(row) => Ok(Some(row.decode()?)),
            None => Ok(None),
        }
    }

    fn get_reviews(&self, user_id: usize) -> Result<Vec<Review>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM review WHERE user_id = ?1",
            ReviewRow::COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id], ReviewRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        let mut reviews = rows
            .into_iter()
            .map(|row| row.decode().map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?;
        reviews.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(reviews)
    }

    fn update_review(
        &self,
        user_id: usize,
        review_id: &str,
        update: ReviewUpdate,
    ) -> Result<Option<Review>> {
        let mut review = match self.get_review(user_id, review_id)? {
            Some(review) => review,
            None => return Ok(None),
        };

        if let Some(title) = update.title {
            review.title = title;
        }
        if let Some(content) = update.content {
            review.content = content;
        }
        if let Some(rating) = update.rating {
            review.rating = rating;
        }
        if let Some(favorite) = update.favorite {
            review.favorite = favorite;
        }
        review.updated_at = Utc::now();

        let conn = self.conn.lock().unwrap();
        Self::write_review(&conn, user_id, &review)?;
        Ok(Some(review))
    }

    fn delete_review(&self, user_id: usize, review_id: &str) -> Result<Option<Review>> {
        let review = match self.get_review(user_id, review_id)? {
            Some(review) => review,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM review WHERE id = ?1 AND user_id = ?2",
            params![review_id, user_id],
        )?;
        Ok(Some(review))
    }

    fn add_milestone(&self, user_id: usize, milestone: NewMilestone) -> Result<Milestone> {
        let now = Utc::now();
        let stored = Milestone {
            id: Uuid::new_v4().to_string(),
            title: milestone.title,
            description: milestone.description,
            icon: milestone.icon,
            date: milestone.date,
            media_id: milestone.media_id,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn.lock().unwrap();
        Self::write_milestone(&conn, user_id, &stored)?;
        Ok(stored)
    }

    fn get_milestones(&self, user_id: usize) -> Result<Vec<Milestone>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM milestone WHERE user_id = ?1",
            MilestoneRow::COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id], MilestoneRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        let mut milestones = rows
            .into_iter()
            .map(|row| row.decode().map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?;
        milestones.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(milestones)
    }

    fn update_milestone(
        &self,
        user_id: usize,
        milestone_id: &str,
        update: MilestoneUpdate,
    ) -> Result<Option<Milestone>> {
        let mut milestone = match self.get_milestone(user_id, milestone_id)? {
            Some(milestone) => milestone,
            None => return Ok(None),
        };

        if let Some(title) = update.title {
            milestone.title = title;
        }
        if let Some(description) = update.description {
            milestone.description = description;
        }
        if let Some(icon) = update.icon {
            milestone.icon = icon;
        }
        if let Some(date) = update.date {
            milestone.date = date;
        }
        if let Some(media_id) = update.media_id {
            milestone.media_id = media_id;
        }
        milestone.updated_at = Utc::now();

        let conn = self.conn.lock().unwrap();
        Self::write_milestone(&conn, user_id, &milestone)?;
        Ok(Some(milestone))
    }

    fn set_milestone_images(
        &self,
        user_id: usize,
        milestone_id: &str,
        images: Vec<String>,
    ) -> Result<Option<Milestone>> {
        let mut milestone = match self.get_milestone(user_id, milestone_id)? {
            Some(milestone) => milestone,
            None => return Ok(None),
        };
        milestone.images = images;
        milestone.updated_at = Utc::now();

        let conn = self.conn.lock().unwrap();
        Self::write_milestone(&conn, user_id, &milestone)?;
        Ok(Some(milestone))
    }

    fn delete_milestone(&self, user_id: usize, milestone_id: &str) -> Result<Option<Milestone>> {
        let milestone = match self.get_milestone(user_id, milestone_id)? {
            Some(milestone) => milestone,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM milestone WHERE id = ?1 AND user_id = ?2",
            params![milestone_id, user_id],
        )?;
        Ok(Some(milestone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::models::{MediaStatus, MediaType};
    use tempfile::TempDir;

    fn create_store() -> (TempDir, SqliteLibraryStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteLibraryStore::new(dir.path().join("library.db")).unwrap();
        (dir, store)
    }

    fn new_game(title: &str) -> NewMediaItem {
        NewMediaItem {
            title: title.to_string(),
            media_type: MediaType::Game,
            status: MediaStatus::Planned,
            rating: None,
            hours_spent: None,
            tags: vec![],
            favorite: false,
        }
    }

    #[test]
    fn media_item_crud_round_trip() {
        let (_dir, store) = create_store();

        let item = store.add_media_item(1, new_game("Hollow Knight")).unwrap();
        assert_eq!(
            store.get_media_item(1, &item.id).unwrap().unwrap().title,
            "Hollow Knight"
        );

        let updated = store
            .update_media_item(
                1,
                &item.id,
                MediaItemUpdate {
                    status: Some(MediaStatus::Completed),
                    rating: Some(Some(9)),
                    hours_spent: Some(Some(48.5)),
                    ..MediaItemUpdate::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, MediaStatus::Completed);
        assert_eq!(updated.rating, Some(9));
        assert!(updated.updated_at >= item.updated_at);

        let deleted = store.delete_media_item(1, &item.id).unwrap().unwrap();
        assert_eq!(deleted.id, item.id);
        assert!(store.get_media_item(1, &item.id).unwrap().is_none());
    }

    #[test]
    fn items_are_scoped_per_user() {
        let (_dir, store) = create_store();
        let item = store.add_media_item(1, new_game("Celeste")).unwrap();

        assert!(store.get_media_item(2, &item.id).unwrap().is_none());
        assert!(store.delete_media_item(2, &item.id).unwrap().is_none());
        assert_eq!(store.get_media_items(2).unwrap().len(), 0);
        assert_eq!(store.get_media_items(1).unwrap().len(), 1);
    }

    #[test]
    fn review_survives_media_item_deletion() {
        let (_dir, store) = create_store();
        let item = store.add_media_item(1, new_game("Outer Wilds")).unwrap();
        let review = store
            .add_review(
                1,
                NewReview {
                    media_id: item.id.clone(),
                    title: "Unmatched".to_string(),
                    content: RichText::parse("Go in blind.").unwrap(),
                    rating: 10,
                    favorite: true,
                },
            )
            .unwrap();

        store.delete_media_item(1, &item.id).unwrap();

        // The dangling media_id is kept as-is.
        let stored = store.get_review(1, &review.id).unwrap().unwrap();
        assert_eq!(stored.media_id, item.id);
    }

    #[test]
    fn malformed_stored_row_is_a_tagged_error() {
        let (_dir, store) = create_store();
        let item = store.add_media_item(1, new_game("Tunic")).unwrap();

        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "UPDATE media_item SET media_type = 'cassette' WHERE id = ?1",
                params![item.id],
            )
            .unwrap();
        }

        let err = store.get_media_item(1, &item.id).unwrap_err();
        assert!(err.downcast_ref::<RecordError>().is_some());
    }

    #[test]
    fn milestone_images_are_replaced_wholesale() {
        let (_dir, store) = create_store();
        let milestone = store
            .add_milestone(
                1,
                NewMilestone {
                    title: "100th game".to_string(),
                    description: RichText::parse("A round number.").unwrap(),
                    icon: "🎮".to_string(),
                    date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    media_id: None,
                },
            )
            .unwrap();

        let updated = store
            .set_milestone_images(
                1,
                &milestone.id,
                vec![
                    "/media/milestones/a".to_string(),
                    "/media/milestones/b".to_string(),
                ],
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.images.len(), 2);
    }
}
