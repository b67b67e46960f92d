//! SQLite persistence for invitation lists.
//!
//! The request path and job workers each hold their own connection to one
//! database file. File-backed connections run in WAL mode so readers do not
//! block the single writer, wait up to [`BUSY_TIMEOUT`] for locks, and
//! enforce foreign keys so page and user rows go away with their list.

pub mod migrations;
pub mod schema;
pub mod store;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database at `path`, creating the file and its directory if
/// needed, and migrate it to the current schema.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or migrated.
pub fn open_store_db(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create directory {}", dir.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open invitation list store {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    let report = migrations::migrate(&mut conn)?;
    debug!(
        path = %path.display(),
        journal_mode = %mode,
        from = report.from,
        to = report.to,
        "opened invitation list store"
    );
    Ok(conn)
}

/// A private, migrated in-memory database.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    migrations::migrate(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pragma<T: rusqlite::types::FromSql>(conn: &Connection, name: &str) -> T {
        conn.pragma_query_value(None, name, |row| row.get(0))
            .expect("pragma")
    }

    #[test]
    fn file_store_is_configured_and_migrated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = open_store_db(&dir.path().join("a/b/lists.sqlite3")).expect("open");

        assert_eq!(pragma::<String>(&conn, "journal_mode").to_lowercase(), "wal");
        assert_eq!(pragma::<i64>(&conn, "foreign_keys"), 1);
        assert_eq!(pragma::<i64>(&conn, "busy_timeout"), 5_000);
        assert_eq!(
            migrations::current_schema_version(&conn).expect("version"),
            migrations::LATEST_SCHEMA_VERSION
        );
    }

    #[test]
    fn deleting_a_list_cascades() {
        let conn = open_in_memory().expect("open");
        conn.execute_batch(
            "INSERT INTO invitation_lists (name, status, creator_id, source, created_at_us) \
               VALUES ('Drive', 'pending', 1, 'enwiki', 0); \
             INSERT INTO invitation_list_pages (list_id, source, page_id, position) \
               VALUES (1, 'enwiki', 10, 0); \
             INSERT INTO invitation_list_users (list_id, author_id, score) VALUES (1, 4, 50); \
             DELETE FROM invitation_lists WHERE list_id = 1;",
        )
        .expect("batch");

        for table in ["invitation_list_pages", "invitation_list_users"] {
            let rows: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .expect("count");
            assert_eq!(rows, 0, "{table}");
        }
    }
}
