use std::sync::Arc;

use crate::api::{Book, BookId, UpdateBookInput};
use crate::books_repository::{BookRepository, BookRepositoryError};

/// Book operations exposed to handlers. Repository results and errors are passed through unchanged
#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, book: Book) -> Result<BookId, BookRepositoryError> {
        self.repository.create(book).await
    }

    pub async fn get_all(&self) -> Result<Vec<Book>, BookRepositoryError> {
        self.repository.get_all().await
    }

    pub async fn get_by_id(&self, book_id: BookId) -> Result<Book, BookRepositoryError> {
        self.repository.get_by_id(book_id).await
    }

    pub async fn update(
        &self,
        book_id: BookId,
        input: UpdateBookInput,
    ) -> Result<(), BookRepositoryError> {
        self.repository.update(book_id, input).await
    }

    pub async fn delete(&self, book_id: BookId) -> Result<(), BookRepositoryError> {
        self.repository.delete(book_id).await
    }
}
