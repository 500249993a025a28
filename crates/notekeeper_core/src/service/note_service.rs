//! Note use-case service.
//!
//! # Responsibility
//! - Provide list/detail/create/edit/delete entry points for identified
//!   users.
//! - Compose access and slug policies over a `NoteStore`.
//!
//! # Invariants
//! - Every operation takes a `&User`; anonymous callers are turned away
//!   before reaching this layer.
//! - A missing note and a foreign note both surface as
//!   `NoteServiceError::NotFound`.
//! - Slug collisions are terminal validation failures, whether caught by
//!   the policy check or by the store's uniqueness constraint.

use crate::model::note::{NewNote, Note, NoteForm};
use crate::model::user::User;
use crate::policy::access::{self, Decision};
use crate::policy::slug::{self as slug_policy, DuplicateSlugError, SlugFormatError};
use crate::repo::note_repo::NoteStore;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level form error. Every variant is keyed to the `slug` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateSlug(DuplicateSlugError),
    MalformedSlug(SlugFormatError),
}

impl ValidationError {
    /// Name of the form field the error belongs to.
    pub fn field(&self) -> &'static str {
        "slug"
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSlug(err) => write!(f, "{err}"),
            Self::MalformedSlug(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateSlug(err) => Some(err),
            Self::MalformedSlug(err) => Some(err),
        }
    }
}

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Submitted form failed validation; caller should re-render it.
    Validation(ValidationError),
    /// The note does not exist or belongs to someone else.
    NotFound,
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{}: {err}", err.field()),
            Self::NotFound => write!(f, "note not found"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SlugConflict(slug) => {
                Self::Validation(ValidationError::DuplicateSlug(DuplicateSlugError { slug }))
            }
            RepoError::NoteNotFound(_) => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

impl From<DuplicateSlugError> for NoteServiceError {
    fn from(value: DuplicateSlugError) -> Self {
        Self::Validation(ValidationError::DuplicateSlug(value))
    }
}

impl From<SlugFormatError> for NoteServiceError {
    fn from(value: SlugFormatError) -> Self {
        Self::Validation(ValidationError::MalformedSlug(value))
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over a store implementation.
pub struct NoteService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> NoteService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists the notes `user` authored, in store order.
    pub fn list_notes(&self, user: &User) -> NoteServiceResult<Vec<Note>> {
        let all = self.store.list_all()?;
        Ok(access::filter_list(user, all))
    }

    /// Returns one note if `user` owns it.
    pub fn note_detail(&self, user: &User, slug: &str) -> NoteServiceResult<Note> {
        self.owned_note(user, slug, access::can_read_detail)
    }

    /// Creates a note owned by `user`.
    ///
    /// # Errors
    /// - `Validation` when the candidate slug is malformed or already taken;
    ///   nothing is written in that case.
    pub fn create_note(&self, user: &User, form: &NoteForm) -> NoteServiceResult<Note> {
        let candidate = slug_policy::candidate(form)?;
        if let Err(err) = slug_policy::validate_unique(&candidate, None, &self.store)? {
            warn!(
                "event=note_create module=service status=conflict slug={}",
                candidate
            );
            return Err(err.into());
        }

        let created = self
            .store
            .insert(&NewNote {
                title: form.title.clone(),
                text: form.text.clone(),
                slug: candidate,
                author: user.id,
            })
            .map_err(|err| log_write_failure("note_create", err))?;

        info!(
            "event=note_create module=service status=ok note_id={} slug={}",
            created.id, created.slug
        );
        Ok(created)
    }

    /// Replaces title, text and slug of a note `user` owns.
    ///
    /// Resubmitting the note's current slug is not a conflict. A blank slug
    /// is re-derived from the new title.
    pub fn edit_note(&self, user: &User, slug: &str, form: &NoteForm) -> NoteServiceResult<Note> {
        let mut note = self.owned_note(user, slug, access::can_edit)?;

        let candidate = slug_policy::candidate(form)?;
        if let Err(err) = slug_policy::validate_unique(&candidate, Some(note.id), &self.store)? {
            warn!(
                "event=note_edit module=service status=conflict note_id={} slug={}",
                note.id, candidate
            );
            return Err(err.into());
        }

        note.title = form.title.clone();
        note.text = form.text.clone();
        note.slug = candidate;
        self.store
            .update(&note)
            .map_err(|err| log_write_failure("note_edit", err))?;

        let updated = self
            .store
            .get_by_id(note.id)?
            .ok_or(NoteServiceError::InconsistentState(
                "edited note not found in read-back",
            ))?;
        info!(
            "event=note_edit module=service status=ok note_id={} slug={}",
            updated.id, updated.slug
        );
        Ok(updated)
    }

    /// Deletes a note `user` owns.
    pub fn delete_note(&self, user: &User, slug: &str) -> NoteServiceResult<()> {
        let note = self.owned_note(user, slug, access::can_delete)?;
        self.store.delete(note.id)?;
        info!(
            "event=note_delete module=service status=ok note_id={}",
            note.id
        );
        Ok(())
    }

    fn owned_note(
        &self,
        user: &User,
        slug: &str,
        check: fn(&User, &Note) -> Decision,
    ) -> NoteServiceResult<Note> {
        match self.store.get_by_slug(slug)? {
            Some(note) if check(user, &note).is_allowed() => Ok(note),
            _ => {
                info!(
                    "event=note_lookup module=service status=not_found slug={}",
                    slug
                );
                Err(NoteServiceError::NotFound)
            }
        }
    }
}

fn log_write_failure(event: &'static str, err: RepoError) -> NoteServiceError {
    match &err {
        RepoError::SlugConflict(slug) => warn!(
            "event={event} module=service status=conflict source=store slug={slug}"
        ),
        other => warn!("event={event} module=service status=error error={other}"),
    }
    err.into()
}
