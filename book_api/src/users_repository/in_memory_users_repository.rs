use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::api::UserId;
use crate::users_repository::{User, UserRepository, UserRepositoryError};

#[derive(Default)]
pub struct InMemoryUsersRepository {
    user_sequence_generator: AtomicI64,
    users: parking_lot::RwLock<BTreeMap<UserId, User>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUsersRepository {
    async fn create(&self, user: User) -> Result<UserId, UserRepositoryError> {
        let mut locked_users = self.users.write();
        if locked_users.values().any(|stored| stored.email == user.email) {
            return Err(UserRepositoryError::AlreadyExists(user.email));
        }
        let id = self.user_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        locked_users.insert(id, User { id, ..user });
        Ok(id)
    }

    async fn get_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserRepositoryError> {
        self.users
            .read()
            .values()
            .find(|user| user.email == email && user.password == password_hash)
            .cloned()
            .ok_or(UserRepositoryError::NotFound)
    }
}
