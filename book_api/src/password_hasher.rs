use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum PasswordHashError {
    #[error("Password hashing salt must not be empty")]
    EmptySalt,
}

/// Deterministic password hashing. The same password always yields the same digest,
/// so stored users can be looked up directly by (email, digest)
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;
}

/// SHA-256 over an application wide salt followed by the password, hex encoded
pub struct Sha256PasswordHasher {
    salt: Vec<u8>,
}

impl Sha256PasswordHasher {
    pub fn new(salt: &str) -> Result<Self, PasswordHashError> {
        if salt.is_empty() {
            return Err(PasswordHashError::EmptySalt);
        }
        Ok(Self {
            salt: salt.as_bytes().to_vec(),
        })
    }
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(password.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}
