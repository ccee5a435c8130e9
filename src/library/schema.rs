//! Schema definition for the library database.

use crate::sqlite_persistence::SchemaVersion;

pub const LIBRARY_VERSIONED_SCHEMAS: &[SchemaVersion] = &[SchemaVersion {
    version: 1,
    up: r#"
            CREATE TABLE IF NOT EXISTS media_item (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                media_type TEXT NOT NULL,
                status TEXT NOT NULL,
                rating INTEGER,
                hours_spent REAL,
                cover_url TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                favorite INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_media_item_user ON media_item(user_id);

            CREATE TABLE IF NOT EXISTS review (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                media_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                rating INTEGER NOT NULL,
                favorite INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_review_user ON review(user_id);

            CREATE TABLE IF NOT EXISTS milestone (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                icon TEXT NOT NULL,
                date TEXT NOT NULL,
                media_id TEXT,
                images TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_milestone_user ON milestone(user_id);
        "#,
}];
