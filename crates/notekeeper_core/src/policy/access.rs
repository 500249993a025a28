//! Ownership-based access decisions for notes.
//!
//! # Invariants
//! - Only a note's author is ever `Allowed` to read, edit or delete it.
//! - A denial is always `Decision::NotFound`: a non-owner probing an
//!   existing slug sees the same outcome as probing a missing one.
//! - List filtering drops foreign notes entirely and keeps store order.

use crate::model::note::Note;
use crate::model::user::{CurrentUser, User};
use log::debug;

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    NotFound,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Note operations gated by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadDetail,
    Edit,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadDetail => "read_detail",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Any identified user may see their own list.
pub fn can_view_list(user: &CurrentUser) -> bool {
    !user.is_anonymous()
}

/// Decides whether `user` may perform `operation` on `note`.
///
/// Every operation shares the same rule: authorship.
pub fn decide(user: &User, note: &Note, operation: Operation) -> Decision {
    let decision = if note.is_authored_by(user.id) {
        Decision::Allowed
    } else {
        Decision::NotFound
    };
    debug!(
        "event=access_check module=policy op={} note_id={} allowed={}",
        operation.as_str(),
        note.id,
        decision.is_allowed()
    );
    decision
}

pub fn can_read_detail(user: &User, note: &Note) -> Decision {
    decide(user, note, Operation::ReadDetail)
}

pub fn can_edit(user: &User, note: &Note) -> Decision {
    decide(user, note, Operation::Edit)
}

pub fn can_delete(user: &User, note: &Note) -> Decision {
    decide(user, note, Operation::Delete)
}

/// Keeps the notes authored by `user`, in their original order.
pub fn filter_list(user: &User, notes: impl IntoIterator<Item = Note>) -> Vec<Note> {
    notes
        .into_iter()
        .filter(|note| note.is_authored_by(user.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        can_delete, can_edit, can_read_detail, can_view_list, filter_list, Decision,
    };
    use crate::model::note::{Note, NoteId};
    use crate::model::user::{CurrentUser, User};

    fn note_by(id: i64, author: &User) -> Note {
        Note {
            id: NoteId::from_raw(id),
            title: format!("Заголовок {id}"),
            text: "Текст заметки".to_string(),
            slug: format!("note-{id}"),
            author: author.id,
        }
    }

    #[test]
    fn owner_is_allowed_every_operation() {
        let author = User::new("Автор");
        let note = note_by(1, &author);
        assert_eq!(can_read_detail(&author, &note), Decision::Allowed);
        assert_eq!(can_edit(&author, &note), Decision::Allowed);
        assert_eq!(can_delete(&author, &note), Decision::Allowed);
    }

    #[test]
    fn non_owner_gets_not_found_for_every_operation() {
        let author = User::new("Автор");
        let reader = User::new("Читатель");
        let note = note_by(1, &author);
        assert_eq!(can_read_detail(&reader, &note), Decision::NotFound);
        assert_eq!(can_edit(&reader, &note), Decision::NotFound);
        assert_eq!(can_delete(&reader, &note), Decision::NotFound);
    }

    #[test]
    fn same_username_different_id_is_not_the_owner() {
        let author = User::new("twin");
        let impostor = User::new("twin");
        let note = note_by(1, &author);
        assert!(!can_edit(&impostor, &note).is_allowed());
    }

    #[test]
    fn list_requires_identified_user() {
        assert!(!can_view_list(&CurrentUser::Anonymous));
        assert!(can_view_list(&CurrentUser::Identified(User::new("Автор"))));
    }

    #[test]
    fn filter_list_keeps_own_notes_in_order() {
        let author = User::new("Автор");
        let reader = User::new("Читатель");
        let notes = vec![
            note_by(1, &author),
            note_by(2, &reader),
            note_by(3, &author),
            note_by(4, &reader),
        ];

        let own = filter_list(&author, notes.clone());
        let ids = own.iter().map(|note| note.id.get()).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 3]);

        let others = filter_list(&reader, notes);
        assert!(others.iter().all(|note| note.author == reader.id));
        assert_eq!(others.len(), 2);
    }

    #[test]
    fn filter_list_of_user_without_notes_is_empty() {
        let author = User::new("Автор");
        let stranger = User::new("Мимо Крокодил");
        assert!(filter_list(&stranger, vec![note_by(1, &author)]).is_empty());
    }

    mod properties {
        use super::super::{can_delete, can_edit, can_read_detail, filter_list, Decision};
        use super::note_by;
        use crate::model::user::User;
        use proptest::prelude::*;
        use uuid::Uuid;

        const POPULATION: usize = 3;

        fn users() -> Vec<User> {
            (0..POPULATION)
                .map(|idx| User::with_id(Uuid::from_u128(idx as u128 + 1), format!("user-{idx}")))
                .collect()
        }

        proptest! {
            #[test]
            fn only_the_author_is_allowed(author_seed: u128, viewer_seed: u128) {
                let author = User::with_id(Uuid::from_u128(author_seed), "author");
                let viewer = User::with_id(Uuid::from_u128(viewer_seed), "viewer");
                let note = note_by(1, &author);
                let expected = if author_seed == viewer_seed {
                    Decision::Allowed
                } else {
                    Decision::NotFound
                };

                prop_assert_eq!(can_read_detail(&viewer, &note), expected);
                prop_assert_eq!(can_edit(&viewer, &note), expected);
                prop_assert_eq!(can_delete(&viewer, &note), expected);
                prop_assert_eq!(can_edit(&author, &note), Decision::Allowed);
            }

            #[test]
            fn filter_list_partitions_notes_by_author(
                owners in proptest::collection::vec(0..POPULATION, 0..40)
            ) {
                let users = users();
                let notes = owners
                    .iter()
                    .enumerate()
                    .map(|(idx, &owner)| note_by(idx as i64 + 1, &users[owner]))
                    .collect::<Vec<_>>();

                let mut seen = 0;
                for user in &users {
                    let own = filter_list(user, notes.clone());
                    let expected = notes
                        .iter()
                        .filter(|note| note.author == user.id)
                        .cloned()
                        .collect::<Vec<_>>();
                    prop_assert_eq!(&own, &expected);
                    seen += own.len();
                }
                prop_assert_eq!(seen, notes.len());
            }
        }
    }
}
