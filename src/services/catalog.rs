//! Book catalog service

use crate::{
    error::AppResult,
    models::book::{Book, BookForm},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all books, ordered by identifier ascending
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get a book by ID, failing with NotFound when absent
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, form: &BookForm) -> AppResult<Book> {
        self.repository.books.create(form).await
    }

    /// Overwrite an existing book
    pub async fn update_book(&self, id: i64, form: &BookForm) -> AppResult<Book> {
        self.repository.books.update(id, form).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
