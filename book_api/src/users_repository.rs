pub use in_memory_users_repository::InMemoryUsersRepository;
pub use postgres_users_repository::PostgresUsersRepository;

use chrono::{DateTime, Utc};

use crate::api::UserId;

mod in_memory_users_repository;
mod postgres_users_repository;

/// Registered user, `password` holds the password digest and never the plaintext
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User with such credentials not found")]
    NotFound,

    #[error("User with email {0} already exists")]
    AlreadyExists(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores the user, returns an id assigned to it. `user.id` is ignored
    async fn create(&self, user: User) -> Result<UserId, UserRepositoryError>;

    /// Finds the user matching both email and password digest
    async fn get_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserRepositoryError>;
}
