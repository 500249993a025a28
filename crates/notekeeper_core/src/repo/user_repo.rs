//! User store contract and SQLite implementation.
//!
//! Users exist so notes have an owner to point at; credentials are not
//! stored here.

use crate::model::user::{User, UserId};
use crate::repo::{constraint_kind, ensure_table_ready, ConstraintKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub trait UserStore {
    /// Registers a user. Usernames are unique.
    fn insert(&self, user: &User) -> RepoResult<User>;
    fn get_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user store.
pub struct SqliteUserStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "users", &["uuid", "username"])?;
        Ok(Self { conn })
    }

    fn query_one(&self, sql: &str, key: String) -> RepoResult<Option<User>> {
        let raw = self
            .conn
            .query_row(sql, [key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;

        raw.map(|(uuid, username)| {
            let id = Uuid::parse_str(&uuid).map_err(|_| {
                RepoError::InvalidData(format!("invalid uuid value `{uuid}` in users.uuid"))
            })?;
            Ok(User::with_id(id, username))
        })
        .transpose()
    }
}

impl UserStore for SqliteUserStore<'_> {
    fn insert(&self, user: &User) -> RepoResult<User> {
        let username = user.username.trim();
        if username.is_empty() {
            return Err(RepoError::InvalidData("username cannot be empty".to_string()));
        }

        self.conn
            .execute(
                "INSERT INTO users (uuid, username) VALUES (?1, ?2);",
                params![user.id.to_string(), username],
            )
            .map_err(|err| match constraint_kind(&err) {
                Some(ConstraintKind::Unique) => RepoError::DuplicateUsername(username.to_string()),
                _ => err.into(),
            })?;

        Ok(User::with_id(user.id, username))
    }

    fn get_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_one(
            "SELECT uuid, username FROM users WHERE uuid = ?1;",
            id.to_string(),
        )
    }

    fn get_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.query_one(
            "SELECT uuid, username FROM users WHERE username = ?1;",
            username.trim().to_string(),
        )
    }
}
