use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{Book, BookId, UpdateBookInput};
use crate::books_repository::{
    prepare_new_book, prepare_update, BookRepository, BookRepositoryError,
};

pub struct PostgresBooksRepository {
    client: Arc<Client>,
}

impl PostgresBooksRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            id              BIGSERIAL PRIMARY KEY,
            title           TEXT NOT NULL,
            author          TEXT NOT NULL,
            publish_date    TIMESTAMPTZ NOT NULL,
            rating          INTEGER NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup books table")?;
        Ok(Self { client })
    }
}

fn book_from_row(row: &Row) -> Result<Book, tokio_postgres::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        publish_date: row.try_get("publish_date")?,
        rating: row.try_get("rating")?,
    })
}

/// Column/value pairs of the fields present in the update, in fixed column order
fn update_assignments(input: &UpdateBookInput) -> Vec<(&'static str, &(dyn ToSql + Sync))> {
    let mut assignments: Vec<(&'static str, &(dyn ToSql + Sync))> = Vec::new();
    if let Some(title) = &input.title {
        assignments.push(("title", title));
    }
    if let Some(author) = &input.author {
        assignments.push(("author", author));
    }
    if let Some(publish_date) = &input.publish_date {
        assignments.push(("publish_date", publish_date));
    }
    if let Some(rating) = &input.rating {
        assignments.push(("rating", rating));
    }
    assignments
}

/// Placeholders are numbered in column order, the book id always takes the last one
fn build_update_statement(columns: &[&str]) -> String {
    let set_clause = columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{} = ${}", column, index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE books SET {} WHERE id = ${}",
        set_clause,
        columns.len() + 1
    )
}

#[async_trait::async_trait]
impl BookRepository for PostgresBooksRepository {
    async fn create(&self, book: Book) -> Result<BookId, BookRepositoryError> {
        let book = prepare_new_book(book)?;

        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO books (title, author, publish_date, rating) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[&book.title, &book.author, &book.publish_date, &book.rating],
            )
            .await?;

        let book_id: BookId = rows
            .first()
            .ok_or_else(|| BookRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(book_id)
    }

    async fn get_all(&self) -> Result<Vec<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, title, author, publish_date, rating FROM books ORDER BY id")
            .await?;

        let rows = self.client.query(&stmt, &[]).await?;

        Ok(rows
            .iter()
            .map(book_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_by_id(&self, book_id: BookId) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, title, author, publish_date, rating FROM books WHERE id = ($1)")
            .await?;

        let row = self
            .client
            .query_opt(&stmt, &[&book_id])
            .await?
            .ok_or(BookRepositoryError::NotFound(book_id))?;

        Ok(book_from_row(&row)?)
    }

    async fn update(
        &self,
        book_id: BookId,
        input: UpdateBookInput,
    ) -> Result<(), BookRepositoryError> {
        let input = prepare_update(input);
        let assignments = update_assignments(&input);
        if assignments.is_empty() {
            return Err(BookRepositoryError::EmptyUpdate);
        }

        let columns: Vec<&str> = assignments.iter().map(|(column, _)| *column).collect();
        let mut params: Vec<&(dyn ToSql + Sync)> =
            assignments.iter().map(|(_, value)| *value).collect();
        params.push(&book_id);

        let stmt: Statement = self
            .client
            .prepare(&build_update_statement(&columns))
            .await?;

        let updated = self.client.execute(&stmt, &params).await?;
        if updated == 0 {
            return Err(BookRepositoryError::NotFound(book_id));
        }
        Ok(())
    }

    async fn delete(&self, book_id: BookId) -> Result<(), BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE id = ($1)")
            .await?;

        self.client.execute(&stmt, &[&book_id]).await?;
        Ok(())
    }
}
