//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the persistence contracts the note service depends on.
//! - Isolate SQL details from policy and service orchestration.
//!
//! # Invariants
//! - Stores report uniqueness violations as semantic errors
//!   (`SlugConflict`, `DuplicateUsername`) rather than raw SQLite errors.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::note::NoteId;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error shared by note and user stores.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No note row exists for the id.
    NoteNotFound(NoteId),
    /// Another note already holds the slug.
    SlugConflict(String),
    /// Another user already holds the username.
    DuplicateUsername(String),
    /// The note references a user the store does not know.
    UnknownAuthor(String),
    InvalidData(String),
    /// Connection was not migrated to the schema this store expects.
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::SlugConflict(slug) => write!(f, "slug already in use: `{slug}`"),
            Self::DuplicateUsername(name) => write!(f, "username already in use: `{name}`"),
            Self::UnknownAuthor(id) => write!(f, "unknown note author: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which constraint a failed write tripped, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    Unique,
    ForeignKey,
}

pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(ConstraintKind::Unique),
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Verifies that `table` exists with every column in `columns`.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    for &column in columns {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}
