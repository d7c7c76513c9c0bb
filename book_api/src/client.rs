use anyhow::{bail, Context};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::api::{
    Book, BookId, CreateBookResponse, SignInInput, SignUpInput, SignUpResponse, TokenResponse,
    UpdateBookInput, UserId,
};

pub struct BookApiClient {
    url: String,
    client: ClientWithMiddleware,
}

impl BookApiClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Calls POST /auth/sign-up endpoint
    /// Returns id of the created user
    pub async fn sign_up(&self, input: &SignUpInput) -> anyhow::Result<UserId> {
        let response = self
            .client
            .post(format!("{}/auth/sign-up", self.url))
            .json(input)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to sign up, status {}", response.status())
        }

        let SignUpResponse { id } = response.json().await?;
        Ok(id)
    }

    /// Calls GET /auth/sign-in endpoint
    /// Returns session token, None if credentials were rejected
    pub async fn sign_in(&self, input: &SignInInput) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/auth/sign-in", self.url))
            .json(input)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            Ok(None)
        } else if response.status().is_success() {
            let TokenResponse { token } = response.json().await?;
            Ok(Some(token))
        } else {
            bail!("Failed to sign in, status {}", response.status())
        }
    }

    /// Calls POST /books endpoint
    /// Returns id of the created book
    pub async fn create_book(&self, token: &str, book: &Book) -> anyhow::Result<BookId> {
        let response = self
            .client
            .post(format!("{}/books", self.url))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(book)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            bail!("Failed to create book, status {}", response.status())
        }

        let CreateBookResponse { id } = response.json().await?;
        Ok(id)
    }

    /// Calls GET /books endpoint
    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let response = self
            .client
            .get(format!("{}/books", self.url))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to list books, status {}", response.status())
        }
        Ok(response.json().await?)
    }

    /// Calls GET /books/{book_id} endpoint
    /// Returns None if book was not in the repository
    pub async fn get_book(&self, book_id: BookId) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .get(format!("{}/books/{}", self.url, book_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to get book, status {}", response.status())
        }
    }

    /// Calls PUT /books/{book_id} endpoint
    /// Returns false if book was not in the repository
    pub async fn update_book(
        &self,
        token: &str,
        book_id: BookId,
        input: &UpdateBookInput,
    ) -> anyhow::Result<bool> {
        let response = self
            .client
            .put(format!("{}/books/{}", self.url, book_id))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(input)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => bail!("Failed to update book, status {}", status),
        }
    }

    /// Calls DELETE /books/{book_id} endpoint
    /// Returns false if book was not in the repository
    pub async fn delete_book(&self, token: &str, book_id: BookId) -> anyhow::Result<bool> {
        let response = self
            .client
            .delete(format!("{}/books/{}", self.url, book_id))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => bail!("Failed to delete book, status {}", status),
        }
    }
}
