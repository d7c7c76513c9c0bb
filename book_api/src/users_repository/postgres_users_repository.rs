use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Statement};

use crate::api::UserId;
use crate::users_repository::{User, UserRepository, UserRepositoryError};

pub struct PostgresUsersRepository {
    client: Arc<Client>,
}

impl PostgresUsersRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS users (
            id              BIGSERIAL PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            registered_at   TIMESTAMPTZ NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup users table")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUsersRepository {
    async fn create(&self, user: User) -> Result<UserId, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO users (name, email, password, registered_at) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &user.name,
                    &user.email,
                    &user.password,
                    &user.registered_at,
                ],
            )
            .await;

        match rows {
            Ok(rows) => Ok(rows
                .first()
                .ok_or_else(|| UserRepositoryError::Other("Id not returned".to_string()))?
                .try_get(0)?),
            Err(err)
                if err
                    .as_db_error()
                    .map(|db_err| db_err.code() == &SqlState::UNIQUE_VIOLATION)
                    .unwrap_or_default() =>
            {
                Err(UserRepositoryError::AlreadyExists(user.email))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }

    async fn get_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "SELECT id, name, email, password, registered_at FROM users WHERE email = $1 AND password = $2",
            )
            .await?;

        let row = self
            .client
            .query_opt(&stmt, &[&email, &password_hash])
            .await?
            .ok_or(UserRepositoryError::NotFound)?;

        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            registered_at: row.try_get("registered_at")?,
        })
    }
}
