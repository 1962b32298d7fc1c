//! Book model and catalog form type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::empty_string_as_none;

/// Full book model from database
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create/edit book form data. Used for both `/livros/novo` and
/// `/livros/editar/{id}`; an update overwrites all four fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year,
            description: book.description.clone(),
        }
    }
}
