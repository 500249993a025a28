use notekeeper_core::db::open_db_in_memory;
use notekeeper_core::routes::login_redirect;
use notekeeper_core::{
    CurrentUser, Method, NoteForm, NoteService, NoteStore, Page, Response, Route, Router,
    SqliteNoteStore, SqliteUserStore, User, UserStore,
};
use rusqlite::Connection;

const NOTE_SLUG: &str = "note-slug";

#[test]
fn public_pages_are_available_to_anonymous_user() {
    let fx = Fixture::new();
    let router = fx.router();

    for route in [Route::Home, Route::Login, Route::Logout, Route::Signup] {
        let response = router
            .handle(&CurrentUser::Anonymous, Method::Get, &route, None)
            .unwrap();
        assert_eq!(response.status_code(), 200, "route: {route}");
    }
}

#[test]
fn list_add_and_success_are_available_to_any_identified_user() {
    let fx = Fixture::new();
    let router = fx.router();

    for route in [Route::NoteList, Route::NoteAdd, Route::NoteSuccess] {
        let response = router
            .handle(&fx.as_reader(), Method::Get, &route, None)
            .unwrap();
        assert_eq!(response.status_code(), 200, "route: {route}");
    }
}

#[test]
fn note_pages_are_available_to_author_only() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    for route in note_routes() {
        let as_author = router
            .handle(&fx.as_author(), Method::Get, &route, None)
            .unwrap();
        assert_eq!(as_author.status_code(), 200, "author, route: {route}");

        let as_reader = router
            .handle(&fx.as_reader(), Method::Get, &route, None)
            .unwrap();
        assert_eq!(as_reader, Response::NotFound, "reader, route: {route}");
    }
}

#[test]
fn anonymous_user_is_redirected_to_login_with_next() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    let mut routes = note_routes().to_vec();
    routes.extend([Route::NoteAdd, Route::NoteSuccess, Route::NoteList]);
    for route in routes {
        let response = router
            .handle(&CurrentUser::Anonymous, Method::Get, &route, None)
            .unwrap();
        let expected = format!("/auth/login/?next={}", route.path());
        assert_eq!(response, Response::Redirect(expected.clone()));
        assert_eq!(login_redirect(&route), expected);
    }
}

#[test]
fn anonymous_user_cant_create_note() {
    let fx = Fixture::new();
    let router = fx.router();

    let form = NoteForm::new("Заголовок", "Текст").with_slug(NOTE_SLUG);
    let response = router
        .handle(
            &CurrentUser::Anonymous,
            Method::Post,
            &Route::NoteAdd,
            Some(&form),
        )
        .unwrap();

    assert_eq!(response, Response::Redirect("/auth/login/?next=/add/".to_string()));
    assert_eq!(router.service().store().count().unwrap(), 0);
}

#[test]
fn list_context_holds_only_own_notes() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    let own = router
        .handle(&fx.as_author(), Method::Get, &Route::NoteList, None)
        .unwrap();
    let foreign = router
        .handle(&fx.as_reader(), Method::Get, &Route::NoteList, None)
        .unwrap();

    assert!(matches!(
        own.page(),
        Some(Page::NoteList { notes }) if notes.len() == 1 && notes[0].slug == NOTE_SLUG
    ));
    assert!(matches!(
        foreign.page(),
        Some(Page::NoteList { notes }) if notes.is_empty()
    ));
}

#[test]
fn add_and_edit_pages_carry_a_form() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    for route in [Route::NoteAdd, Route::NoteEdit(NOTE_SLUG.to_string())] {
        let response = router
            .handle(&fx.as_author(), Method::Get, &route, None)
            .unwrap();
        let page = response.page().expect("form page expected");
        assert!(page.form().is_some(), "route: {route}");
    }
}

#[test]
fn edit_form_is_prefilled_with_note() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    let response = router
        .handle(
            &fx.as_author(),
            Method::Get,
            &Route::NoteEdit(NOTE_SLUG.to_string()),
            None,
        )
        .unwrap();
    let form = response.page().and_then(Page::form).unwrap();
    assert_eq!(form.slug.as_deref(), Some(NOTE_SLUG));
    assert_eq!(form.title, "Заголовок");
}

#[test]
fn successful_create_redirects_to_success_page() {
    let fx = Fixture::new();
    let router = fx.router();

    let form = NoteForm::new("Заголовок", "Текст");
    let response = router
        .handle(&fx.as_author(), Method::Post, &Route::NoteAdd, Some(&form))
        .unwrap();

    assert_eq!(response, Response::Redirect("/done/".to_string()));
    let created = router.service().store().get_by_slug("zagolovok").unwrap();
    assert_eq!(created.map(|note| note.author), Some(fx.author.id));
}

#[test]
fn duplicate_slug_rerenders_form_with_slug_error() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    let form = NoteForm::new("Другой", "Текст").with_slug(NOTE_SLUG);
    let response = router
        .handle(&fx.as_author(), Method::Post, &Route::NoteAdd, Some(&form))
        .unwrap();

    let page = response.page().expect("form should be re-rendered");
    assert_eq!(page.form(), Some(&form));
    assert_eq!(page.errors().len(), 1);
    assert_eq!(page.errors()[0].field, "slug");
    assert_eq!(
        page.errors()[0].message,
        format!("{NOTE_SLUG} - this value already exists, please choose another")
    );
    assert_eq!(router.service().store().count().unwrap(), 1);
}

#[test]
fn edit_to_taken_slug_rerenders_form_with_slug_error() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);
    let second = router
        .service()
        .create_note(&fx.author, &NoteForm::new("Второй", "текст").with_slug("second"))
        .unwrap();

    let form = NoteForm::new("Второй", "текст").with_slug(NOTE_SLUG);
    let response = router
        .handle(
            &fx.as_author(),
            Method::Post,
            &Route::NoteEdit("second".to_string()),
            Some(&form),
        )
        .unwrap();

    assert_eq!(response.status_code(), 200);
    let page = response.page().expect("form should be re-rendered");
    assert_eq!(page.form(), Some(&form));
    assert_eq!(page.errors().len(), 1);
    assert_eq!(page.errors()[0].field, "slug");
    assert_eq!(
        page.errors()[0].message,
        format!("{NOTE_SLUG} - this value already exists, please choose another")
    );
    let stored = router.service().store().get_by_id(second.id).unwrap();
    assert_eq!(stored, Some(second));
}

#[test]
fn missing_title_is_rejected_before_reaching_service() {
    let fx = Fixture::new();
    let router = fx.router();

    let form = NoteForm::new("", "Текст").with_slug("untitled");
    let response = router
        .handle(&fx.as_author(), Method::Post, &Route::NoteAdd, Some(&form))
        .unwrap();

    let page = response.page().unwrap();
    assert_eq!(page.errors()[0].field, "title");
    assert_eq!(router.service().store().count().unwrap(), 0);
}

#[test]
fn other_user_cant_edit_or_delete_note() {
    let fx = Fixture::new();
    let router = fx.router();
    let note = fx.seed_note(&router);

    let form = NoteForm::new("Новое название", "Новый текст").with_slug("new-slug");
    let edit = router
        .handle(
            &fx.as_reader(),
            Method::Post,
            &Route::NoteEdit(NOTE_SLUG.to_string()),
            Some(&form),
        )
        .unwrap();
    let delete = router
        .handle(
            &fx.as_reader(),
            Method::Post,
            &Route::NoteDelete(NOTE_SLUG.to_string()),
            None,
        )
        .unwrap();

    assert_eq!(edit, Response::NotFound);
    assert_eq!(delete, Response::NotFound);
    let stored = router.service().store().get_by_id(note.id).unwrap();
    assert_eq!(stored, Some(note));
}

#[test]
fn author_can_edit_and_delete_note() {
    let fx = Fixture::new();
    let router = fx.router();
    fx.seed_note(&router);

    let form = NoteForm::new("Новое название", "Новый текст").with_slug("new-slug");
    let edit = router
        .handle(
            &fx.as_author(),
            Method::Post,
            &Route::NoteEdit(NOTE_SLUG.to_string()),
            Some(&form),
        )
        .unwrap();
    assert_eq!(edit, Response::Redirect("/done/".to_string()));

    let delete = router
        .handle(
            &fx.as_author(),
            Method::Post,
            &Route::NoteDelete("new-slug".to_string()),
            None,
        )
        .unwrap();
    assert_eq!(delete, Response::Redirect("/done/".to_string()));
    assert_eq!(router.service().store().count().unwrap(), 0);
}

fn note_routes() -> [Route; 3] {
    [
        Route::NoteDetail(NOTE_SLUG.to_string()),
        Route::NoteEdit(NOTE_SLUG.to_string()),
        Route::NoteDelete(NOTE_SLUG.to_string()),
    ]
}

struct Fixture {
    conn: Connection,
    author: User,
    reader: User,
}

impl Fixture {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let (author, reader) = {
            let users = SqliteUserStore::try_new(&conn).unwrap();
            (
                users.insert(&User::new("Автор")).unwrap(),
                users.insert(&User::new("Читатель")).unwrap(),
            )
        };
        Self {
            conn,
            author,
            reader,
        }
    }

    fn router(&self) -> Router<SqliteNoteStore<'_>> {
        Router::new(NoteService::new(
            SqliteNoteStore::try_new(&self.conn).unwrap(),
        ))
    }

    fn as_author(&self) -> CurrentUser {
        CurrentUser::Identified(self.author.clone())
    }

    fn as_reader(&self) -> CurrentUser {
        CurrentUser::Identified(self.reader.clone())
    }

    fn seed_note(&self, router: &Router<SqliteNoteStore<'_>>) -> notekeeper_core::Note {
        router
            .service()
            .create_note(
                &self.author,
                &NoteForm::new("Заголовок", "Текст заметки").with_slug(NOTE_SLUG),
            )
            .unwrap()
    }
}
