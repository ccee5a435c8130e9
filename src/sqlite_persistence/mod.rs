//! Additive versioned SQLite schemas.
//!
//! Each store owns an ordered list of [`SchemaVersion`]s. On open, every
//! version above the database's current `PRAGMA user_version` is applied in
//! order. Versions are additive only; there is no down migration.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Offset added to schema versions before storing them in `PRAGMA
/// user_version`, so that a database created by an unrelated tool (version 0
/// or some small number) is never mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 77000;

pub struct SchemaVersion {
    pub version: usize,
    pub up: &'static str,
}

/// Applies all schema versions newer than the database's current version.
///
/// Returns the number of versions applied.
pub fn apply_versioned_schemas(conn: &Connection, schemas: &[SchemaVersion]) -> Result<usize> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let raw_version: usize = conn
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .context("Failed to read user_version")? as usize;

    if raw_version != 0 && raw_version < BASE_DB_VERSION {
        bail!(
            "Database has unrecognized user_version {} (not created by this tool?)",
            raw_version
        );
    }

    let current = raw_version.saturating_sub(BASE_DB_VERSION);
    let mut applied = 0;

    for schema in schemas {
        if schema.version <= current {
            continue;
        }
        conn.execute_batch(schema.up)
            .with_context(|| format!("Failed to apply schema version {}", schema.version))?;
        conn.execute_batch(&format!(
            "PRAGMA user_version = {}",
            BASE_DB_VERSION + schema.version
        ))?;
        applied += 1;
    }

    Ok(applied)
}
