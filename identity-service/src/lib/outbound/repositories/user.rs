use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::RepositoryError;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// User store held in process memory.
///
/// Every write takes the lock once, so the email uniqueness check in
/// [`UserRepository::add`] and [`UserRepository::update`] is atomic with the write.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<UserId, User>, email: &str, except: Option<UserId>) -> bool {
    users
        .values()
        .any(|u| !u.is_deleted() && u.email.as_str() == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn find_deleted_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(id).filter(|u| u.is_deleted()).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut matching: Vec<&User> = users.values().filter(|u| u.email.as_str() == email).collect();

        // Live user first, then the most recently deleted one
        matching.sort_by_key(|u| {
            (
                u.is_deleted(),
                std::cmp::Reverse(u.deletion().map(|d| d.deleted_at)),
            )
        });

        Ok(matching.first().map(|u| (*u).clone()))
    }

    async fn is_email_unique(&self, email: &str) -> Result<bool, RepositoryError> {
        let users = self.users.read().await;
        Ok(!email_taken(&users, email, None))
    }

    async fn add(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;

        if email_taken(&users, user.email.as_str(), None) {
            return Err(RepositoryError::EmailAlreadyExists(user.email.to_string()));
        }

        users.insert(user.id, user);
        Ok(())
    }

    async fn update(&self, user: User, expected_deleted: bool) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;

        match users.get(&user.id) {
            None => return Err(RepositoryError::NotFound(user.id.to_string())),
            Some(stored) if stored.is_deleted() != expected_deleted => {
                return Err(RepositoryError::Conflict(user.id.to_string()));
            }
            Some(_) => {}
        }

        if !user.is_deleted() && email_taken(&users, user.email.as_str(), Some(user.id)) {
            return Err(RepositoryError::EmailAlreadyExists(user.email.to_string()));
        }

        users.insert(user.id, user);
        Ok(())
    }
}
