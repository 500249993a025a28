//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate policy checks and store calls into use-case level APIs.
//! - Keep routing and CLI layers decoupled from storage details.

pub mod note_service;
