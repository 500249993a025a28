//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and look them up by slug, id or author.
//! - Backstop slug uniqueness at the storage layer.
//!
//! # Invariants
//! - `slug` carries a `UNIQUE` constraint; a violating insert/update fails
//!   with `RepoError::SlugConflict` even when callers skip policy checks.
//! - `update` never rewrites `author_uuid`.
//! - Listing order is insertion order (`id ASC`).

use crate::model::note::{NewNote, Note, NoteId};
use crate::model::user::UserId;
use crate::repo::{constraint_kind, ensure_table_ready, ConstraintKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    text,
    slug,
    author_uuid
FROM notes";

/// Persistence contract consumed by the note service.
pub trait NoteStore {
    /// Persists a new note and returns it with its store-assigned id.
    fn insert(&self, note: &NewNote) -> RepoResult<Note>;
    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Note>>;
    fn get_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists every note in insertion order.
    fn list_all(&self) -> RepoResult<Vec<Note>>;
    /// Lists one author's notes in insertion order.
    fn list_by_author(&self, author: UserId) -> RepoResult<Vec<Note>>;
    /// Rewrites title, text and slug of an existing note.
    fn update(&self, note: &Note) -> RepoResult<()>;
    fn delete(&self, id: NoteId) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;
}

impl<S: NoteStore + ?Sized> NoteStore for &S {
    fn insert(&self, note: &NewNote) -> RepoResult<Note> {
        (**self).insert(note)
    }

    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Note>> {
        (**self).get_by_slug(slug)
    }

    fn get_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get_by_id(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        (**self).list_all()
    }

    fn list_by_author(&self, author: UserId) -> RepoResult<Vec<Note>> {
        (**self).list_by_author(author)
    }

    fn update(&self, note: &Note) -> RepoResult<()> {
        (**self).update(note)
    }

    fn delete(&self, id: NoteId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the connection
    ///   was not opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "notes",
            &["id", "title", "text", "slug", "author_uuid"],
        )?;
        Ok(Self { conn })
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn insert(&self, note: &NewNote) -> RepoResult<Note> {
        self.conn
            .execute(
                "INSERT INTO notes (title, text, slug, author_uuid)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    note.title.as_str(),
                    note.text.as_str(),
                    note.slug.as_str(),
                    note.author.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, note.slug.as_str(), note.author))?;

        Ok(Note {
            id: NoteId::from_raw(self.conn.last_insert_rowid()),
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
            author: note.author,
        })
    }

    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Note>> {
        self.query_one(&format!("{NOTE_SELECT_SQL} WHERE slug = ?1;"), slug)
    }

    fn get_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.query_one(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"), id.get())
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn list_by_author(&self, author: UserId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE author_uuid = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([author.to_string()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn update(&self, note: &Note) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE notes
                 SET
                    title = ?2,
                    text = ?3,
                    slug = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    note.id.get(),
                    note.title.as_str(),
                    note.text.as_str(),
                    note.slug.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, note.slug.as_str(), note.author))?;

        if changed == 0 {
            return Err(RepoError::NoteNotFound(note.id));
        }
        Ok(())
    }

    fn delete(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.get()])?;
        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }
}

impl SqliteNoteStore<'_> {
    fn query_one(&self, sql: &str, key: impl rusqlite::ToSql) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_row([key], |row| {
                Ok((
                    row.get::<_, i64>("id")?,
                    row.get::<_, String>("title")?,
                    row.get::<_, String>("text")?,
                    row.get::<_, String>("slug")?,
                    row.get::<_, String>("author_uuid")?,
                ))
            })
            .optional()?;

        raw.map(|(id, title, text, slug, author)| {
            Ok(Note {
                id: NoteId::from_raw(id),
                title,
                text,
                slug,
                author: parse_author(&author)?,
            })
        })
        .transpose()
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let author: String = row.get("author_uuid")?;
    Ok(Note {
        id: NoteId::from_raw(row.get("id")?),
        title: row.get("title")?,
        text: row.get("text")?,
        slug: row.get("slug")?,
        author: parse_author(&author)?,
    })
}

fn parse_author(value: &str) -> RepoResult<UserId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in notes.author_uuid"))
    })
}

fn map_write_error(err: rusqlite::Error, slug: &str, author: UserId) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::Unique) => RepoError::SlugConflict(slug.to_string()),
        Some(ConstraintKind::ForeignKey) => RepoError::UnknownAuthor(author.to_string()),
        None => err.into(),
    }
}
