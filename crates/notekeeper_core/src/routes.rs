//! Request routing and presentation boundary.
//!
//! # Responsibility
//! - Name every page of the notes application and its URL path.
//! - Apply the login-required gate before any note operation.
//! - Map service outcomes to page, redirect or not-found responses.
//!
//! # Invariants
//! - Anonymous access to a gated route redirects to
//!   `/auth/login/?next=<original path>`.
//! - Access denials render as `Response::NotFound` (404), never as a
//!   forbidden response.
//! - Successful writes redirect to the success page.

use crate::model::note::{FieldError, Note, NoteForm};
use crate::model::user::{AuthContext, CurrentUser, User};
use crate::repo::note_repo::NoteStore;
use crate::service::note_service::{NoteService, NoteServiceError};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static NOTE_ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(note|edit|delete)/([-a-zA-Z0-9_]+)/$").expect("valid note route regex")
});

/// Every page the application serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Logout,
    Signup,
    NoteList,
    NoteAdd,
    NoteSuccess,
    NoteDetail(String),
    NoteEdit(String),
    NoteDelete(String),
}

impl Route {
    /// URL path for this route.
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/auth/login/".to_string(),
            Self::Logout => "/auth/logout/".to_string(),
            Self::Signup => "/auth/signup/".to_string(),
            Self::NoteList => "/notes/".to_string(),
            Self::NoteAdd => "/add/".to_string(),
            Self::NoteSuccess => "/done/".to_string(),
            Self::NoteDetail(slug) => format!("/note/{slug}/"),
            Self::NoteEdit(slug) => format!("/edit/{slug}/"),
            Self::NoteDelete(slug) => format!("/delete/{slug}/"),
        }
    }

    /// Parses a URL path back into a route.
    pub fn resolve(path: &str) -> Option<Self> {
        let route = match path {
            "/" => Self::Home,
            "/auth/login/" => Self::Login,
            "/auth/logout/" => Self::Logout,
            "/auth/signup/" => Self::Signup,
            "/notes/" => Self::NoteList,
            "/add/" => Self::NoteAdd,
            "/done/" => Self::NoteSuccess,
            other => {
                let caps = NOTE_ROUTE_RE.captures(other)?;
                let slug = caps[2].to_string();
                match &caps[1] {
                    "note" => Self::NoteDetail(slug),
                    "edit" => Self::NoteEdit(slug),
                    _ => Self::NoteDelete(slug),
                }
            }
        };
        Some(route)
    }

    /// Whether anonymous callers must log in first.
    pub fn requires_login(&self) -> bool {
        !matches!(self, Self::Home | Self::Login | Self::Logout | Self::Signup)
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Redirect target sending an anonymous caller to log in and come back.
pub fn login_redirect(route: &Route) -> String {
    format!("{}?next={}", Route::Login.path(), route.path())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Rendered page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Logout,
    Signup,
    Success,
    NoteList { notes: Vec<Note> },
    NoteForm { form: NoteForm, errors: Vec<FieldError> },
    NoteDetail { note: Note },
    DeleteConfirm { note: Note },
}

impl Page {
    /// The form carried by add/edit pages.
    pub fn form(&self) -> Option<&NoteForm> {
        match self {
            Self::NoteForm { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Field errors carried by add/edit pages.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::NoteForm { errors, .. } => errors,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Page(Page),
    Redirect(String),
    NotFound,
    MethodNotAllowed,
}

impl Response {
    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Page(_) => 200,
            Self::Redirect(_) => 302,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }

    pub fn page(&self) -> Option<&Page> {
        match self {
            Self::Page(page) => Some(page),
            _ => None,
        }
    }

    fn success() -> Self {
        Self::Redirect(Route::NoteSuccess.path())
    }
}

/// Dispatches requests to the note service.
pub struct Router<S: NoteStore> {
    service: NoteService<S>,
}

impl<S: NoteStore> Router<S> {
    pub fn new(service: NoteService<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &NoteService<S> {
        &self.service
    }

    /// Handles one request.
    ///
    /// `form` is the submitted payload for POSTs to add/edit routes; a
    /// missing payload is treated as an empty form.
    ///
    /// # Errors
    /// Only store-level failures escape; policy outcomes become responses.
    pub fn handle(
        &self,
        auth: &impl AuthContext,
        method: Method,
        route: &Route,
        form: Option<&NoteForm>,
    ) -> Result<Response, NoteServiceError> {
        let current = auth.current_user();
        let response = match &current {
            CurrentUser::Anonymous if route.requires_login() => {
                Response::Redirect(login_redirect(route))
            }
            CurrentUser::Anonymous => public_page(method, route),
            CurrentUser::Identified(user) => self.dispatch(user, method, route, form)?,
        };

        debug!(
            "event=route_dispatch module=routes method={} path={} anonymous={} status={}",
            method.as_str(),
            route,
            current.is_anonymous(),
            response.status_code()
        );
        Ok(response)
    }

    fn dispatch(
        &self,
        user: &User,
        method: Method,
        route: &Route,
        form: Option<&NoteForm>,
    ) -> Result<Response, NoteServiceError> {
        let empty = NoteForm::default();
        let submitted = form.unwrap_or(&empty);

        match (route, method) {
            (Route::NoteList, Method::Get) => Ok(Response::Page(Page::NoteList {
                notes: self.service.list_notes(user)?,
            })),
            (Route::NoteSuccess, Method::Get) => Ok(Response::Page(Page::Success)),
            (Route::NoteAdd, Method::Get) => Ok(form_page(NoteForm::default(), Vec::new())),
            (Route::NoteAdd, Method::Post) => {
                let errors = submitted.validate();
                if !errors.is_empty() {
                    return Ok(form_page(submitted.clone(), errors));
                }
                let result = self.service.create_note(user, submitted).map(|_| ());
                write_outcome(result, submitted)
            }
            (Route::NoteDetail(slug), Method::Get) => {
                not_found_or(self.service.note_detail(user, slug), |note| {
                    Page::NoteDetail { note }
                })
            }
            (Route::NoteEdit(slug), Method::Get) => {
                not_found_or(self.service.note_detail(user, slug), |note| {
                    Page::NoteForm {
                        form: NoteForm::from_note(&note),
                        errors: Vec::new(),
                    }
                })
            }
            (Route::NoteEdit(slug), Method::Post) => {
                match self.service.note_detail(user, slug) {
                    Ok(_) => {}
                    Err(NoteServiceError::NotFound) => return Ok(Response::NotFound),
                    Err(err) => return Err(err),
                }
                let errors = submitted.validate();
                if !errors.is_empty() {
                    return Ok(form_page(submitted.clone(), errors));
                }
                let result = self.service.edit_note(user, slug, submitted).map(|_| ());
                write_outcome(result, submitted)
            }
            (Route::NoteDelete(slug), Method::Get) => {
                not_found_or(self.service.note_detail(user, slug), |note| {
                    Page::DeleteConfirm { note }
                })
            }
            (Route::NoteDelete(slug), Method::Post) => {
                write_outcome(self.service.delete_note(user, slug), submitted)
            }
            _ => Ok(public_page(method, route)),
        }
    }
}

fn public_page(method: Method, route: &Route) -> Response {
    if method != Method::Get {
        return Response::MethodNotAllowed;
    }
    match route {
        Route::Home => Response::Page(Page::Home),
        Route::Login => Response::Page(Page::Login),
        Route::Logout => Response::Page(Page::Logout),
        Route::Signup => Response::Page(Page::Signup),
        _ => Response::MethodNotAllowed,
    }
}

fn form_page(form: NoteForm, errors: Vec<FieldError>) -> Response {
    Response::Page(Page::NoteForm { form, errors })
}

fn not_found_or(
    result: Result<Note, NoteServiceError>,
    render: impl FnOnce(Note) -> Page,
) -> Result<Response, NoteServiceError> {
    match result {
        Ok(note) => Ok(Response::Page(render(note))),
        Err(NoteServiceError::NotFound) => Ok(Response::NotFound),
        Err(err) => Err(err),
    }
}

fn write_outcome(
    result: Result<(), NoteServiceError>,
    submitted: &NoteForm,
) -> Result<Response, NoteServiceError> {
    match result {
        Ok(()) => Ok(Response::success()),
        Err(NoteServiceError::NotFound) => Ok(Response::NotFound),
        Err(NoteServiceError::Validation(err)) => Ok(form_page(
            submitted.clone(),
            vec![FieldError {
                field: err.field(),
                message: err.to_string(),
            }],
        )),
        Err(err) => Err(err),
    }
}
