//! Schema definition for the user database.

use crate::sqlite_persistence::SchemaVersion;

pub const USER_VERSIONED_SCHEMAS: &[SchemaVersion] = &[SchemaVersion {
    version: 1,
    up: r#"
            CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                handle TEXT NOT NULL UNIQUE,
                created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int))
            );

            CREATE INDEX IF NOT EXISTS idx_user_handle ON user(handle);

            CREATE TABLE IF NOT EXISTS auth_token (
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                value TEXT NOT NULL UNIQUE,
                created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int)),
                last_used INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_auth_token_value ON auth_token(value);

            CREATE TABLE IF NOT EXISTS user_profile (
                user_id INTEGER PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
                data TEXT NOT NULL,
                updated INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int))
            );

            CREATE TABLE IF NOT EXISTS user_achievement (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                achievement_id TEXT NOT NULL,
                title TEXT NOT NULL,
                image TEXT NOT NULL,
                category TEXT NOT NULL,
                unlocked_at TEXT NOT NULL,
                UNIQUE (user_id, achievement_id)
            );

            CREATE INDEX IF NOT EXISTS idx_user_achievement_user ON user_achievement(user_id);

            CREATE TABLE IF NOT EXISTS notification (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT,
                data TEXT NOT NULL,
                created INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notification_user ON notification(user_id);
        "#,
}];
