use notekeeper_core::db::open_db;
use notekeeper_core::{
    NoteForm, NoteService, NoteServiceError, NoteStore, SqliteNoteStore, SqliteUserStore, User,
    UserStore, ValidationError,
};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

const WRITERS: usize = 4;

#[test]
fn racing_writers_claim_a_slug_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let author = {
        let conn = open_db(&path).unwrap();
        let users = SqliteUserStore::try_new(&conn).unwrap();
        users.insert(&User::new("Автор")).unwrap()
    };

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles = (0..WRITERS)
        .map(|idx| {
            let path: PathBuf = path.clone();
            let author = author.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = NoteService::new(SqliteNoteStore::try_new(&conn).unwrap());
                let form = NoteForm::new(format!("Заметка {idx}"), "Текст").with_slug("contested");
                barrier.wait();
                service.create_note(&author, &form).map(|_| ())
            })
        })
        .collect::<Vec<_>>();

    let outcomes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1);
    for outcome in outcomes.into_iter().filter_map(Result::err) {
        assert!(
            matches!(
                outcome,
                NoteServiceError::Validation(ValidationError::DuplicateSlug(ref err))
                    if err.slug == "contested"
            ),
            "unexpected error: {outcome}"
        );
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    assert_eq!(store.count().unwrap(), 1);
}
