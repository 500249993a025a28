//! Note database bootstrap.
//!
//! # Responsibility
//! - Hand out connections whose `users`/`notes` schema is current.
//! - Name the step that failed when a connection cannot be prepared.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - A connection returned from `open_db*` has every migration applied;
//!   note and user stores rely on that and never migrate themselves.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
pub use rusqlite::Connection;

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the note database.
#[derive(Debug)]
pub enum DbError {
    /// Opening the file or applying pragmas failed.
    Sqlite(rusqlite::Error),
    /// Migration `version` failed; none of the pending migrations were kept.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build with a schema this one lacks.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl DbError {
    /// Stable identifier used in `db_open` log events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite_failed",
            Self::Migration { .. } => "db_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "note database error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "note schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "note database has schema {found}, this build understands up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
