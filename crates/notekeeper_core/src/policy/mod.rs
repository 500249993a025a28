//! Note policies: who may touch a note and which slug it may carry.
//!
//! Both submodules are pure decision logic; neither mutates the store.

pub mod access;
pub mod slug;

pub use access::Decision;
