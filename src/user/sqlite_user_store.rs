use super::auth::{AuthToken, AuthTokenValue};
use super::profile::UserProfile;
use super::schema::USER_VERSIONED_SCHEMAS;
use super::user_store::{UserAuthTokenStore, UserStore};
use crate::gamification::UserAchievement;
use crate::library::models::{parse_timestamp, RecordError};
use crate::notifications::{Notification, NotificationKind};
use crate::sqlite_persistence::apply_versioned_schemas;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_file_path: P) -> Result<Self> {
        let conn = Connection::open(db_file_path.as_ref())
            .with_context(|| format!("Failed to open user db {:?}", db_file_path.as_ref()))?;
        let applied = apply_versioned_schemas(&conn, USER_VERSIONED_SCHEMAS)?;
        if applied > 0 {
            info!("Applied {} user schema version(s)", applied);
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn read_auth_token(row: &rusqlite::Row) -> rusqlite::Result<AuthToken> {
        Ok(AuthToken {
            user_id: row.get::<_, i64>(0)? as usize,
            value: AuthTokenValue(row.get(1)?),
            created: row.get(2)?,
            last_used: row.get(3)?,
        })
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![token.0],
                Self::read_auth_token,
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let existing = conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![token.0],
                Self::read_auth_token,
            )
            .optional()?;
        if existing.is_some() {
            conn.execute("DELETE FROM auth_token WHERE value = ?1", params![token.0])?;
        }
        Ok(existing)
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![Utc::now().timestamp(), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO auth_token (user_id, value, created, last_used) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token.user_id as i64,
                token.value.0,
                token.created,
                token.last_used
            ],
        )?;
        if inserted == 0 {
            bail!("Auth token already exists");
        }
        Ok(())
    }

    fn get_all_user_auth_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.user_id, t.value, t.created, t.last_used \
             FROM auth_token t JOIN user u ON u.id = t.user_id \
             WHERE u.handle = ?1 ORDER BY t.created ASC",
        )?;
        let tokens = stmt
            .query_map(params![user_handle], Self::read_auth_token)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let cutoff = Utc::now().timestamp() - (unused_for_days as i64) * 24 * 60 * 60;
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE COALESCE(last_used, created) < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (handle) VALUES (?1)",
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user '{}'", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT handle FROM user WHERE id = ?1",
                params![user_id as i64],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id FROM user WHERE handle = ?1",
                params![user_handle],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|id| id as usize))
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT handle FROM user ORDER BY id ASC")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(handles)
    }

    fn get_user_profile(&self, user_id: usize) -> Result<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT data FROM user_profile WHERE user_id = ?1",
                params![user_id as i64],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => {
                let profile =
                    serde_json::from_str(&raw).map_err(|e| RecordError::Malformed {
                        field: "profile",
                        reason: e.to_string(),
                    })?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    fn set_user_profile(&self, user_id: usize, profile: &UserProfile) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_profile (user_id, data, updated) VALUES (?1, ?2, ?3) \
             ON CONFLICT (user_id) DO UPDATE SET data = ?2, updated = ?3",
            params![
                user_id as i64,
                serde_json::to_string(profile)?,
                Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    fn get_user_achievements(&self, user_id: usize) -> Result<Vec<UserAchievement>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT achievement_id, title, image, category, unlocked_at \
             FROM user_achievement WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut achievements = Vec::with_capacity(rows.len());
        for (achievement_id, title, image, category, unlocked_at) in rows {
            achievements.push(UserAchievement {
                achievement_id,
                title,
                image,
                category,
                unlocked_at: parse_timestamp("unlocked_at", &unlocked_at)?,
            });
        }
        Ok(achievements)
    }

    fn add_user_achievement(&self, user_id: usize, achievement: &UserAchievement) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO user_achievement \
             (user_id, achievement_id, title, image, category, unlocked_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id as i64,
                achievement.achievement_id,
                achievement.title,
                achievement.image,
                achievement.category,
                achievement.unlocked_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn append_notification(
        &self,
        user_id: usize,
        notification: &Notification,
    ) -> Result<Notification> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO notification (user_id, kind, title, body, data, created) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id as i64,
                notification.kind.as_str(),
                notification.title,
                notification.body,
                serde_json::to_string(&notification.data)?,
                notification.created,
            ],
        )?;
        let mut stored = notification.clone();
        stored.id = Some(conn.last_insert_rowid() as usize);
        Ok(stored)
    }

    fn get_user_notifications(&self, user_id: usize, limit: usize) -> Result<Vec<Notification>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, kind, title, body, data, created FROM notification \
             WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![user_id as i64, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut notifications = Vec::with_capacity(rows.len());
        for (id, kind, title, body, data, created) in rows {
            let kind = NotificationKind::from_str(&kind).ok_or(RecordError::UnknownVariant {
                field: "kind",
                value: kind.clone(),
            })?;
            let data = serde_json::from_str(&data).map_err(|e| RecordError::Malformed {
                field: "data",
                reason: e.to_string(),
            })?;
            notifications.push(Notification {
                id: Some(id as usize),
                kind,
                title,
                body,
                data,
                created,
            });
        }
        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (TempDir, SqliteUserStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(dir.path().join("users.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn create_and_look_up_users() {
        let (_dir, store) = create_store();
        let id = store.create_user("ana").unwrap();

        assert_eq!(store.get_user_id("ana").unwrap(), Some(id));
        assert_eq!(store.get_user_handle(id).unwrap(), Some("ana".to_string()));
        assert_eq!(store.get_user_id("bob").unwrap(), None);
        assert!(store.create_user("ana").is_err(), "handles are unique");
    }

    #[test]
    fn auth_token_lifecycle() {
        let (_dir, store) = create_store();
        let user_id = store.create_user("ana").unwrap();

        let token = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: Utc::now().timestamp(),
            last_used: None,
        };
        store.add_user_auth_token(token.clone()).unwrap();

        let fetched = store.get_user_auth_token(&token.value).unwrap().unwrap();
        assert_eq!(fetched.user_id, user_id);
        assert_eq!(fetched.last_used, None);

        store
            .update_user_auth_token_last_used_timestamp(&token.value)
            .unwrap();
        let fetched = store.get_user_auth_token(&token.value).unwrap().unwrap();
        assert!(fetched.last_used.is_some());

        assert_eq!(store.get_all_user_auth_tokens("ana").unwrap().len(), 1);

        let deleted = store.delete_user_auth_token(&token.value).unwrap();
        assert!(deleted.is_some());
        assert!(store.get_user_auth_token(&token.value).unwrap().is_none());
    }

    #[test]
    fn prune_removes_stale_tokens() {
        let (_dir, store) = create_store();
        let user_id = store.create_user("ana").unwrap();

        let stale = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: Utc::now().timestamp() - 90 * 24 * 60 * 60,
            last_used: None,
        };
        let fresh = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: Utc::now().timestamp(),
            last_used: None,
        };
        store.add_user_auth_token(stale.clone()).unwrap();
        store.add_user_auth_token(fresh.clone()).unwrap();

        let pruned = store.prune_unused_auth_tokens(30).unwrap();
        assert_eq!(pruned, 1);
        assert!(store.get_user_auth_token(&stale.value).unwrap().is_none());
        assert!(store.get_user_auth_token(&fresh.value).unwrap().is_some());
    }

    #[test]
    fn profile_round_trips() {
        let (_dir, store) = create_store();
        let user_id = store.create_user("ana").unwrap();

        assert!(store.get_user_profile(user_id).unwrap().is_none());

        let profile = UserProfile {
            display_name: "Ana".to_string(),
            bio: "catalogging everything".to_string(),
            ..UserProfile::default()
        };
        store.set_user_profile(user_id, &profile).unwrap();
        assert_eq!(store.get_user_profile(user_id).unwrap(), Some(profile));

        let replacement = UserProfile {
            display_name: "Ana Clara".to_string(),
            ..UserProfile::default()
        };
        store.set_user_profile(user_id, &replacement).unwrap();
        assert_eq!(
            store
                .get_user_profile(user_id)
                .unwrap()
                .unwrap()
                .display_name,
            "Ana Clara"
        );
    }

    #[test]
    fn achievement_unlocks_are_idempotent() {
        let (_dir, store) = create_store();
        let user_id = store.create_user("ana").unwrap();

        let achievement = UserAchievement {
            achievement_id: "primeiro_game".to_string(),
            title: "Primeiro Game".to_string(),
            image: "/achievements/primeiro_game.png".to_string(),
            category: "games".to_string(),
            unlocked_at: Utc::now(),
        };
        store.add_user_achievement(user_id, &achievement).unwrap();
        store.add_user_achievement(user_id, &achievement).unwrap();

        let unlocked = store.get_user_achievements(user_id).unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].achievement_id, "primeiro_game");
        assert_eq!(unlocked[0].title, "Primeiro Game");
    }

    #[test]
    fn notifications_are_returned_newest_first() {
        let (_dir, store) = create_store();
        let user_id = store.create_user("ana").unwrap();

        for title in ["a", "b", "c"] {
            store
                .append_notification(
                    user_id,
                    &Notification {
                        id: None,
                        kind: NotificationKind::AchievementUnlocked,
                        title: title.to_string(),
                        body: None,
                        data: serde_json::json!({}),
                        created: Utc::now().timestamp(),
                    },
                )
                .unwrap();
        }

        let notifications = store.get_user_notifications(user_id, 2).unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].title, "c");
        assert_eq!(notifications[1].title, "b");
    }
}
