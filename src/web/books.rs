//! Book catalog route handlers

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookForm},
        user::CurrentUser,
    },
    AppState,
};

use super::{
    flash::{flash, take_flashes, FlashMessage},
    AuthenticatedUser, FieldErrors,
};

/// Book list template
#[derive(Template, WebTemplate)]
#[template(path = "books/list.html")]
pub struct BookListTemplate {
    pub flashes: Vec<FlashMessage>,
    pub current_user: CurrentUser,
    pub books: Vec<Book>,
}

/// New book template
#[derive(Template, WebTemplate)]
#[template(path = "books/new.html")]
pub struct NewBookTemplate {
    pub flashes: Vec<FlashMessage>,
    pub form: BookForm,
    pub errors: FieldErrors,
}

/// Edit book template
#[derive(Template, WebTemplate)]
#[template(path = "books/edit.html")]
pub struct EditBookTemplate {
    pub flashes: Vec<FlashMessage>,
    pub book_id: i64,
    pub form: BookForm,
    pub errors: FieldErrors,
}

/// Reject non-administrators with a danger notice and a redirect to the
/// list, leaving no trace of the attempted mutation.
async fn require_admin(
    user: &CurrentUser,
    session: &Session,
    message: &str,
) -> AppResult<Option<Response>> {
    if user.is_admin {
        return Ok(None);
    }
    flash(session, FlashMessage::danger(message)).await?;
    Ok(Some(Redirect::to("/livros").into_response()))
}

/// List all books
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(current_user): AuthenticatedUser,
    session: Session,
) -> AppResult<BookListTemplate> {
    Ok(BookListTemplate {
        flashes: take_flashes(&session).await?,
        current_user,
        books: state.services.catalog.list_books().await?,
    })
}

/// Display the new book form
pub async fn new_book_page(
    AuthenticatedUser(user): AuthenticatedUser,
    session: Session,
) -> AppResult<Response> {
    if let Some(denied) = require_admin(&user, &session, "Only administrators can add books.").await? {
        return Ok(denied);
    }

    Ok(NewBookTemplate {
        flashes: take_flashes(&session).await?,
        form: BookForm::default(),
        errors: FieldErrors::default(),
    }
    .into_response())
}

/// Handle new book submission
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    session: Session,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    if let Some(denied) = require_admin(&user, &session, "Only administrators can add books.").await? {
        return Ok(denied);
    }

    if let Err(errors) = form.validate() {
        return Ok(NewBookTemplate {
            flashes: Vec::new(),
            errors: FieldErrors::from(&errors),
            form,
        }
        .into_response());
    }

    let book = state.services.catalog.create_book(&form).await?;
    tracing::info!("Book {} created by {}", book.id, user.email);
    flash(&session, FlashMessage::success("Book added.")).await?;
    Ok(Redirect::to("/livros").into_response())
}

/// Display the edit form, pre-populated from the existing record
pub async fn edit_book_page(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if let Some(denied) = require_admin(&user, &session, "Access denied.").await? {
        return Ok(denied);
    }

    let book = state.services.catalog.get_book(id).await?;

    Ok(EditBookTemplate {
        flashes: take_flashes(&session).await?,
        book_id: book.id,
        form: BookForm::from(&book),
        errors: FieldErrors::default(),
    }
    .into_response())
}

/// Handle edit submission, overwriting all four mutable fields
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    if let Some(denied) = require_admin(&user, &session, "Access denied.").await? {
        return Ok(denied);
    }

    if let Err(errors) = form.validate() {
        return Ok(EditBookTemplate {
            flashes: Vec::new(),
            book_id: id,
            errors: FieldErrors::from(&errors),
            form,
        }
        .into_response());
    }

    let book = state.services.catalog.update_book(id, &form).await?;
    tracing::info!("Book {} updated by {}", book.id, user.email);
    flash(&session, FlashMessage::success("Book updated.")).await?;
    Ok(Redirect::to("/livros").into_response())
}

/// Delete a book. Mutating only via POST keeps link pre-fetchers and
/// bookmarks from deleting records.
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if let Some(denied) = require_admin(&user, &session, "Only administrators can delete books.").await? {
        return Ok(denied);
    }

    state.services.catalog.delete_book(id).await?;
    tracing::info!("Book {} deleted by {}", id, user.email);
    flash(&session, FlashMessage::info("Book removed.")).await?;
    Ok(Redirect::to("/livros").into_response())
}
