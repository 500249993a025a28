//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted `Note` record and its unsaved counterpart.
//! - Define the form payload submitted by create/edit flows.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never changes.
//! - `slug` is unique across every note, compared case-sensitively.
//! - `author` is set once at creation.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Maximum title length accepted by note forms, in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Maximum slug length, in characters. Derived slugs are truncated to it.
pub const SLUG_MAX_CHARS: usize = 100;

/// Store-assigned note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    /// Wraps a raw store key. Only stores should mint ids.
    pub fn from_raw(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub text: String,
    pub slug: String,
    /// Owning user. Only this user may read, edit or delete the note.
    pub author: UserId,
}

impl Note {
    /// Returns whether `user_id` owns this note.
    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author == user_id
    }
}

/// A note that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author: UserId,
}

/// Error message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Create/edit form payload.
///
/// An absent or blank `slug` asks the service to derive one from `title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteForm {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl NoteForm {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            slug: None,
        }
    }

    /// Sets an explicit slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Returns the explicit slug, treating blank input as absent.
    pub fn explicit_slug(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Checks the fields every presentation layer enforces before a form
    /// reaches the service. Slug rules are left to the service.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let title_chars = self.title.trim().chars().count();
        if title_chars == 0 {
            errors.push(FieldError {
                field: "title",
                message: "this field is required".to_string(),
            });
        } else if title_chars > TITLE_MAX_CHARS {
            errors.push(FieldError {
                field: "title",
                message: format!(
                    "title has {title_chars} characters; at most {TITLE_MAX_CHARS} are allowed"
                ),
            });
        }
        errors
    }

    /// Builds a prefilled form from a stored note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: Some(note.slug.clone()),
        }
    }
}
