//! SQLite migration registry and executor.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - All pending migrations commit together or not at all.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_users_notes.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_notes_author_index.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    latest_of(MIGRATIONS)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database was written by a newer
///   binary.
/// - `Migration` naming the script that failed; nothing is applied in that
///   case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    apply_set(conn, MIGRATIONS)
}

fn latest_of(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn apply_set(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let current = current_user_version(conn)?;
    let latest = latest_of(migrations);

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current,
            supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations.iter().filter(|m| m.version > current) {
        let step = format!(
            "{}\nPRAGMA user_version = {};",
            migration.sql, migration.version
        );
        if let Err(source) = tx.execute_batch(&step) {
            error!(
                "event=db_migrate module=db status=error version={} error={source}",
                migration.version
            );
            return Err(DbError::Migration {
                version: migration.version,
                source,
            });
        }
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={current} to_version={latest}");
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
