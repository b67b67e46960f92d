//! Ordered schema upgrades tracked by `PRAGMA user_version`.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::info;

use super::schema;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "lists, pages, users",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "read-path indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Highest version in [`MIGRATIONS`].
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Result of one [`migrate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: u32,
    pub to: u32,
    pub applied: Vec<&'static str>,
}

/// # Errors
///
/// Returns an error if the pragma cannot be read or holds a negative value.
pub fn current_schema_version(conn: &Connection) -> Result<u32> {
    let raw: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("read user_version")?;
    u32::try_from(raw).with_context(|| format!("user_version {raw} is out of range"))
}

/// Bring the schema up to [`LATEST_SCHEMA_VERSION`].
///
/// Each step commits together with its version bump. A database written by a
/// newer schema is refused rather than opened.
///
/// # Errors
///
/// Returns an error if a step fails or the database is newer than this build.
pub fn migrate(conn: &mut Connection) -> Result<MigrationReport> {
    let from = current_schema_version(conn)?;
    if from > LATEST_SCHEMA_VERSION {
        bail!(
            "store schema version {from} is newer than supported version {LATEST_SCHEMA_VERSION}"
        );
    }

    let mut applied = Vec::new();
    for step in MIGRATIONS.iter().filter(|m| m.version > from) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)
            .with_context(|| format!("apply migration {} ({})", step.version, step.name))?;
        tx.pragma_update(None, "user_version", i64::from(step.version))?;
        tx.execute(
            "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
            [i64::from(step.version)],
        )?;
        tx.commit()?;

        info!(version = step.version, name = step.name, "applied store migration");
        applied.push(step.name);
    }

    Ok(MigrationReport {
        from,
        to: LATEST_SCHEMA_VERSION,
        applied,
    })
}
