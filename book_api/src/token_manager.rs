use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::UserId;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,

    #[error("Failed to issue token: {0}")]
    Issue(String),

    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Token lifetime must be positive and representable, got {0}")]
    InvalidTtl(Duration),
}

/// Issues and verifies HS256 signed session tokens. Nothing is stored server side,
/// a token is valid as long as its signature checks out and it has not expired
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenManager {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if ttl <= Duration::zero() || Utc::now().checked_add_signed(ttl).is_none() {
            return Err(TokenError::InvalidTtl(ttl));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Issue("token expiry is out of range".to_string()))?;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &self.encoding_key,
        )
        .map_err(|err| TokenError::Issue(err.to_string()))
    }

    /// Verifies the token and returns the user id it was issued for
    pub fn parse(&self, token: &str) -> Result<UserId, TokenError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err.to_string()),
            })?;

        token_data
            .claims
            .sub
            .parse()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))
    }
}
