pub use in_memory_books_repository::InMemoryBookRepository;
pub use postgres_books_repository::PostgresBooksRepository;

use chrono::{DateTime, SubsecRound, Utc};

use crate::api::{Book, BookId, UpdateBookInput};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Update request does not contain any field")]
    EmptyUpdate,

    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Adds book to repository, returns an id assigned to the book.
    /// Title and author must not be empty
    async fn create(&self, book: Book) -> Result<BookId, BookRepositoryError>;
    /// Lists all books in the repository
    async fn get_all(&self) -> Result<Vec<Book>, BookRepositoryError>;
    /// Retrieves the book from repository
    async fn get_by_id(&self, book_id: BookId) -> Result<Book, BookRepositoryError>;
    /// Changes only the fields present in `input`, fails with `EmptyUpdate` when none is present
    async fn update(
        &self,
        book_id: BookId,
        input: UpdateBookInput,
    ) -> Result<(), BookRepositoryError>;
    /// Removes the book, removing a book that does not exist is not an error
    async fn delete(&self, book_id: BookId) -> Result<(), BookRepositoryError>;
}

/// Checks required fields and brings the book to the precision every store keeps
fn prepare_new_book(book: Book) -> Result<Book, BookRepositoryError> {
    if book.title.is_empty() || book.author.is_empty() {
        return Err(BookRepositoryError::Validation(
            "title and author are required".to_string(),
        ));
    }
    Ok(Book {
        publish_date: truncate_to_micros(book.publish_date),
        ..book
    })
}

fn prepare_update(input: UpdateBookInput) -> UpdateBookInput {
    UpdateBookInput {
        publish_date: input.publish_date.map(truncate_to_micros),
        ..input
    }
}

/// TIMESTAMPTZ keeps microseconds
fn truncate_to_micros(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(6)
}
