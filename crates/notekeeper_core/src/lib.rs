//! Core domain logic for Notekeeper.
//! This crate owns note ownership, slug and routing rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod routes;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{FieldError, NewNote, Note, NoteForm, NoteId};
pub use model::user::{AuthContext, CurrentUser, User, UserId};
pub use policy::access::Decision;
pub use policy::slug::{DuplicateSlugError, SlugFormatError};
pub use repo::note_repo::{NoteStore, SqliteNoteStore};
pub use repo::user_repo::{SqliteUserStore, UserStore};
pub use repo::{RepoError, RepoResult};
pub use routes::{Method, Page, Response, Route, Router};
pub use service::note_service::{
    NoteService, NoteServiceError, NoteServiceResult, ValidationError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
