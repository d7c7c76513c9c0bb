use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::json;

use crate::api::{Book, BookId, UpdateBookInput};
use crate::books_repository::{
    prepare_new_book, prepare_update, BookRepository, BookRepositoryError,
};

#[derive(Default)]
pub struct InMemoryBookRepository {
    book_sequence_generator: AtomicI64,
    books: parking_lot::RwLock<BTreeMap<BookId, Book>>,
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn create(&self, book: Book) -> Result<BookId, BookRepositoryError> {
        let book = prepare_new_book(book)?;
        let id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        self.books.write().insert(id, Book { id, ..book });
        Ok(id)
    }

    async fn get_all(&self) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self.books.read().values().cloned().collect())
    }

    async fn get_by_id(&self, book_id: BookId) -> Result<Book, BookRepositoryError> {
        self.books
            .read()
            .get(&book_id)
            .cloned()
            .ok_or(BookRepositoryError::NotFound(book_id))
    }

    async fn update(
        &self,
        book_id: BookId,
        input: UpdateBookInput,
    ) -> Result<(), BookRepositoryError> {
        if input.is_empty() {
            return Err(BookRepositoryError::EmptyUpdate);
        }
        let input = prepare_update(input);
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(BookRepositoryError::NotFound(book_id))?;

        // absent fields are skipped on serialization, so the merge only touches present ones
        let mut result_book = json!(book);
        json_patch::merge(&mut result_book, &json!(input));
        *book = serde_json::from_value(result_book)?;
        Ok(())
    }

    async fn delete(&self, book_id: BookId) -> Result<(), BookRepositoryError> {
        self.books.write().remove(&book_id);
        Ok(())
    }
}
