use std::sync::Arc;

use chrono::Utc;
use validator::{Validate, ValidationErrors};

use crate::api::{SignInInput, SignUpInput, UserId};
use crate::password_hasher::{PasswordHashError, PasswordHasher};
use crate::token_manager::{TokenError, TokenManager};
use crate::users_repository::{User, UserRepository, UserRepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid credentials")]
    CredentialsInvalid,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] PasswordHashError),

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),

    #[error(transparent)]
    Repository(#[from] UserRepositoryError),
}

impl From<TokenError> for UserServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(reason) => Self::InvalidToken(reason),
            TokenError::Expired => Self::ExpiredToken,
            TokenError::Issue(reason) => Self::TokenIssue(reason),
            err @ (TokenError::EmptySecret | TokenError::InvalidTtl(_)) => {
                Self::TokenIssue(err.to_string())
            }
        }
    }
}

/// Sign up, sign in and session token verification
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenManager,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
        }
    }

    pub async fn sign_up(&self, input: SignUpInput) -> Result<UserId, UserServiceError> {
        input.validate()?;

        let password = self.hasher.hash(&input.password)?;
        let user = User {
            id: 0,
            name: input.name,
            email: input.email,
            password,
            registered_at: Utc::now(),
        };

        Ok(self.repository.create(user).await?)
    }

    /// Returns a signed session token for the user matching the credentials
    pub async fn sign_in(&self, input: SignInInput) -> Result<String, UserServiceError> {
        input.validate()?;

        let password = self.hasher.hash(&input.password)?;
        let user = self
            .repository
            .get_by_credentials(&input.email, &password)
            .await
            .map_err(|err| match err {
                UserRepositoryError::NotFound => UserServiceError::CredentialsInvalid,
                other => other.into(),
            })?;

        Ok(self.tokens.issue(user.id)?)
    }

    /// Verifies the session token, returns id of the authenticated user
    pub fn parse_token(&self, token: &str) -> Result<UserId, UserServiceError> {
        Ok(self.tokens.parse(token)?)
    }
}
