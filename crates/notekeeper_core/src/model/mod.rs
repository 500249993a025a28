//! Domain model for notes and their owners.
//!
//! # Responsibility
//! - Define the canonical `Note` and `User` records used by policies and
//!   services.
//! - Define the per-request identity seam (`AuthContext`).
//!
//! # Invariants
//! - A note's `author` is fixed at creation and never rewritten.
//! - Note identifiers are assigned by the store, user identifiers by the
//!   caller that registers the user.

pub mod note;
pub mod user;
