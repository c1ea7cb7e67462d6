//! Migration runner
//!
//! Applies migrations with checksums, gap detection, and idempotency, and
//! rolls them back in reverse order

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, migration_gap, Result};
use crate::migrations::checksums::migration_checksum;
use crate::migrations::embedded::{get_migrations, Migration};
use rusqlite::Connection;
use tracing::info;

/// One embedded migration and whether it is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: &'static str,
    /// Unix seconds when the migration was applied
    pub applied_at: Option<i64>,
}

struct AppliedRow {
    migration_id: String,
    applied_at: i64,
    checksum: Option<String>,
}

/// Apply all pending migrations to the database
///
/// Returns the ids applied by this call, in order; an up-to-date database
/// yields an empty list.
///
/// # Errors
///
/// `ConstraintViolation` when the recorded history diverges from the
/// embedded migrations (gap or checksum mismatch), `Persistence` when a
/// script fails.
pub fn apply_migrations(conn: &mut Connection) -> Result<Vec<&'static str>> {
    create_schema_version_table(conn)?;

    let migrations = get_migrations();
    let applied = verified_history(conn, &migrations)?;

    let mut newly_applied = Vec::new();
    for migration in migrations.iter().skip(applied.len()) {
        apply_migration(conn, migration)?;
        info!(migration_id = migration.id, "migration applied");
        newly_applied.push(migration.id);
    }

    Ok(newly_applied)
}

/// Roll back the last `steps` applied migrations, newest first
///
/// Returns the ids rolled back.
///
/// # Errors
///
/// Same history checks as [`apply_migrations`]; `Persistence` when a down
/// script fails.
pub fn rollback_migrations(conn: &mut Connection, steps: usize) -> Result<Vec<&'static str>> {
    create_schema_version_table(conn)?;

    let migrations = get_migrations();
    let applied = verified_history(conn, &migrations)?;

    let mut rolled_back = Vec::new();
    for migration in migrations[..applied.len()].iter().rev().take(steps) {
        revert_migration(conn, migration)?;
        info!(migration_id = migration.id, "migration rolled back");
        rolled_back.push(migration.id);
    }

    Ok(rolled_back)
}

/// Every embedded migration with its applied timestamp, if any
///
/// # Errors
///
/// Same history checks as [`apply_migrations`].
pub fn migration_status(conn: &Connection) -> Result<Vec<MigrationStatus>> {
    create_schema_version_table(conn)?;

    let migrations = get_migrations();
    let applied = verified_history(conn, &migrations)?;

    Ok(migrations
        .iter()
        .enumerate()
        .map(|(i, m)| MigrationStatus {
            id: m.id,
            applied_at: applied.get(i).map(|row| row.applied_at),
        })
        .collect())
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Recorded history, checked to be a prefix of the embedded order with matching checksums
fn verified_history(conn: &Connection, migrations: &[Migration]) -> Result<Vec<AppliedRow>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, applied_at, checksum FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let applied = stmt
        .query_map([], |row| {
            Ok(AppliedRow {
                migration_id: row.get(0)?,
                applied_at: row.get(1)?,
                checksum: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    for (position, row) in applied.iter().enumerate() {
        let Some(migration) = migrations.get(position) else {
            return Err(migration_gap(position, "<none>", &row.migration_id));
        };
        if migration.id != row.migration_id {
            return Err(migration_gap(position, migration.id, &row.migration_id));
        }
        let expected = migration_checksum(migration);
        if let Some(stored) = &row.checksum {
            if *stored != expected {
                return Err(checksum_mismatch(migration.id, &expected, stored));
            }
        }
    }

    Ok(applied)
}

/// Apply a single migration and record it
fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let checksum = migration_checksum(migration);

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(migration.up)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration.id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    Ok(())
}

/// Run a migration's down script and forget it
fn revert_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(migration.down)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;

    tx.execute(
        "DELETE FROM schema_version WHERE migration_id = ?",
        [migration.id],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    Ok(())
}
